/// Operator interaction used by every flow.
///
/// `None` from [`Prompter::choose`] or [`Prompter::input`] means the operator
/// backed out (escape, interrupt or closed input); flows abort on it.
pub trait Prompter {
    async fn choose(&mut self, title: &str, items: &[String]) -> Option<usize>;
    async fn input(&mut self, prompt: &str) -> Option<String>;
    fn notify(&mut self, message: &str);
    async fn acknowledge(&mut self);
}
