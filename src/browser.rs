use tracing::{debug, warn};

use crate::error::{NavError, compact_error};
use crate::exec::{CommandExecutor, list_dir_args};
use crate::model::{ContainerRef, DirEntry, NavigationState, ResourceRef};
use crate::prompt::Prompter;

pub const PARENT_LABEL: &str = ".. (Parent Directory)";
pub const SELECT_LABEL: &str = "[ SELECT CURRENT PATH ]";

/// Leading metadata columns of `ls -la` (mode, links, owner, group, size,
/// month, day, time) before the name.
const METADATA_FIELDS: usize = 8;

#[derive(Debug, Clone, Eq, PartialEq)]
pub enum BrowseChoice {
    Up,
    SelectCurrent,
    Enter(DirEntry),
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub enum BrowseState {
    Listing(NavigationState),
    AwaitingChoice(NavigationState, Vec<DirEntry>),
    NavigatingUp(NavigationState),
    NavigatingDown(NavigationState, DirEntry),
    Selected(String),
    Cancelled,
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub enum BrowseOutcome {
    Selected(String),
    Cancelled,
}

pub async fn list_dir<E: CommandExecutor>(
    executor: &E,
    pod: &ResourceRef,
    container: &ContainerRef,
    path: &str,
) -> Result<Vec<DirEntry>, NavError> {
    let output = executor
        .run(&list_dir_args(pod, container, path))
        .await
        .map_err(|error| NavError::DirectoryList {
            path: path.to_string(),
            detail: compact_error(&error),
        })?;

    if !output.success() {
        let detail = match output.stderr.trim() {
            "" => match output.exit_code {
                Some(code) => format!("ls exited with status {code}"),
                None => "ls terminated by signal".to_string(),
            },
            stderr => stderr.to_string(),
        };
        return Err(NavError::DirectoryList {
            path: path.to_string(),
            detail,
        });
    }

    parse_listing(&output.stdout).ok_or_else(|| NavError::DirectoryList {
        path: path.to_string(),
        detail: format!("unrecognised listing output: {}", output.stdout.trim()),
    })
}

enum ListingLine {
    Entry(DirEntry),
    SelfOrParent,
    Unparsed,
}

/// Parses `ls -la` output. The first line is skipped by position (the
/// `total N` summary) without checking its content. Returns `None` when
/// there were lines to read but none of them looked like a listing row.
pub fn parse_listing(stdout: &str) -> Option<Vec<DirEntry>> {
    let mut entries = Vec::new();
    let mut recognised = false;
    let mut unparsed = 0;
    for line in stdout.lines().skip(1).filter(|line| !line.trim().is_empty()) {
        match parse_listing_line(line) {
            ListingLine::Entry(entry) => {
                recognised = true;
                entries.push(entry);
            }
            ListingLine::SelfOrParent => recognised = true,
            ListingLine::Unparsed => {
                debug!("skipping listing line {line:?}");
                unparsed += 1;
            }
        }
    }

    if !recognised && unparsed > 0 {
        return None;
    }
    Some(entries)
}

fn parse_listing_line(line: &str) -> ListingLine {
    let fields = line.split_whitespace().collect::<Vec<_>>();
    let Some(mode) = fields.first() else {
        return ListingLine::Unparsed;
    };
    // Device files print `major, minor` where other entries print a size.
    let is_device = (mode.starts_with('b') || mode.starts_with('c'))
        && fields.get(4).is_some_and(|major| major.ends_with(','));
    let metadata = if is_device {
        METADATA_FIELDS + 1
    } else {
        METADATA_FIELDS
    };
    if fields.len() <= metadata {
        return ListingLine::Unparsed;
    }

    let mut name = fields[metadata..].join(" ");
    if mode.starts_with('l')
        && let Some((link, _target)) = name.split_once(" -> ")
    {
        name = link.to_string();
    }
    if name == "." || name == ".." {
        return ListingLine::SelfOrParent;
    }

    ListingLine::Entry(if mode.starts_with('d') {
        DirEntry::dir(name)
    } else {
        DirEntry::file(name)
    })
}

/// Labelled menu rows, each carrying the action it resolves to.
pub fn menu_choices(nav: &NavigationState, entries: Vec<DirEntry>) -> Vec<(String, BrowseChoice)> {
    let mut choices = Vec::with_capacity(entries.len() + 2);
    if !nav.is_root() {
        choices.push((PARENT_LABEL.to_string(), BrowseChoice::Up));
    }
    for entry in entries {
        let label = if entry.is_dir {
            format!("{}/", entry.name)
        } else {
            entry.name.clone()
        };
        choices.push((label, BrowseChoice::Enter(entry)));
    }
    choices.push((SELECT_LABEL.to_string(), BrowseChoice::SelectCurrent));
    choices
}

pub fn apply_choice(nav: NavigationState, choice: BrowseChoice) -> BrowseState {
    match choice {
        BrowseChoice::Up => BrowseState::NavigatingUp(nav),
        BrowseChoice::SelectCurrent => BrowseState::Selected(nav.current_path().to_string()),
        BrowseChoice::Enter(entry) if entry.is_dir => BrowseState::NavigatingDown(nav, entry),
        BrowseChoice::Enter(entry) => BrowseState::Selected(nav.path_of(&entry)),
    }
}

pub fn after_empty_listing(nav: NavigationState) -> BrowseState {
    if nav.is_root() {
        BrowseState::Cancelled
    } else {
        BrowseState::NavigatingUp(nav)
    }
}

pub struct Browser<'a, E, P> {
    executor: &'a E,
    prompter: &'a mut P,
}

impl<'a, E: CommandExecutor, P: Prompter> Browser<'a, E, P> {
    pub fn new(executor: &'a E, prompter: &'a mut P) -> Self {
        Self { executor, prompter }
    }

    pub async fn browse(&mut self, start: NavigationState) -> BrowseOutcome {
        let mut state = BrowseState::Listing(start);
        loop {
            state = match state {
                BrowseState::Selected(path) => return BrowseOutcome::Selected(path),
                BrowseState::Cancelled => return BrowseOutcome::Cancelled,
                other => self.step(other).await,
            };
        }
    }

    async fn step(&mut self, state: BrowseState) -> BrowseState {
        match state {
            BrowseState::Listing(nav) => {
                let listed =
                    list_dir(self.executor, &nav.pod, &nav.container, nav.current_path()).await;
                match listed {
                    Ok(entries) if !entries.is_empty() => BrowseState::AwaitingChoice(nav, entries),
                    Ok(_) => {
                        debug!("{} is empty", nav.current_path());
                        self.prompter
                            .notify(&format!("No files found in {}.", nav.current_path()));
                        after_empty_listing(nav)
                    }
                    Err(error) => {
                        warn!("{error}");
                        self.prompter
                            .notify(&format!("Error listing files: {error}"));
                        after_empty_listing(nav)
                    }
                }
            }
            BrowseState::AwaitingChoice(nav, entries) => {
                let title = format!(
                    "{} [{}] Files in {}:",
                    nav.pod,
                    nav.container,
                    nav.current_path()
                );
                let choices = menu_choices(&nav, entries);
                let labels = choices
                    .iter()
                    .map(|(label, _)| label.clone())
                    .collect::<Vec<_>>();
                let picked = self
                    .prompter
                    .choose(&title, &labels)
                    .await
                    .and_then(|index| choices.into_iter().nth(index));
                match picked {
                    Some((_, choice)) => apply_choice(nav, choice),
                    None => BrowseState::Cancelled,
                }
            }
            BrowseState::NavigatingUp(nav) => BrowseState::Listing(nav.ascend()),
            BrowseState::NavigatingDown(nav, entry) => BrowseState::Listing(nav.descend(&entry)),
            terminal => terminal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{
        BrowseChoice, BrowseOutcome, BrowseState, Browser, PARENT_LABEL, SELECT_LABEL,
        apply_choice, list_dir, menu_choices, parse_listing,
    };
    use crate::error::NavError;
    use crate::exec::CommandOutput;
    use crate::model::{ContainerRef, DirEntry, NavigationState, ResourceRef};
    use crate::testing::{ScriptedExecutor, ScriptedPrompter, listing};

    fn root() -> NavigationState {
        NavigationState::at_root(ResourceRef::new("ns1", "api-7f"), ContainerRef::new("api"))
    }

    #[test]
    fn parse_listing_skips_header_and_dot_entries() {
        let stdout = "\
total 12
drwxr-xr-x    1 root     root          4096 Mar  3 10:00 .
drwxr-xr-x    1 root     root          4096 Mar  3 10:00 ..
drwxr-xr-x    2 root     root          4096 Mar  3 10:00 logs
-rw-r--r--    1 root     root           120 Mar  3 10:00 app.conf
";
        assert_eq!(
            parse_listing(stdout),
            Some(vec![DirEntry::dir("logs"), DirEntry::file("app.conf")])
        );
    }

    #[test]
    fn parse_listing_keeps_names_with_spaces() {
        let stdout = "\
total 4
-rw-r--r-- 1 app app 10 Jan  1  2024 quarterly report final.txt
drwxr-xr-x 2 app app 4096 Jan  1 12:00 My Documents
";
        assert_eq!(
            parse_listing(stdout),
            Some(vec![
                DirEntry::file("quarterly report final.txt"),
                DirEntry::dir("My Documents"),
            ])
        );
    }

    #[test]
    fn parse_listing_strips_symlink_target() {
        let stdout = "\
total 0
lrwxrwxrwx 1 root root 7 Jan  1 12:00 current -> release-42
";
        assert_eq!(parse_listing(stdout), Some(vec![DirEntry::file("current")]));
    }

    #[test]
    fn parse_listing_drops_first_line_by_position() {
        let stdout = "-rw-r--r-- 1 root root 1 Jan  1 12:00 only.txt\n";
        assert_eq!(parse_listing(stdout), Some(Vec::new()));
        assert_eq!(parse_listing(""), Some(Vec::new()));
    }

    #[test]
    fn parse_listing_reads_device_names_past_major_minor() {
        let stdout = "\
total 0
crw-rw-rw- 1 root root 1, 3 Mar  3 10:00 null
brw-rw---- 1 root disk 259, 0 Mar  3 10:00 nvme0n1
";
        assert_eq!(
            parse_listing(stdout),
            Some(vec![DirEntry::file("null"), DirEntry::file("nvme0n1")])
        );
    }

    #[test]
    fn parse_listing_rejects_output_with_no_rows() {
        assert_eq!(parse_listing("total 0\nshort line\n"), None);
        assert_eq!(
            parse_listing("total 0\nsh: ls: applet not found\ngarbage\n"),
            None
        );
    }

    #[tokio::test]
    async fn unrecognised_listing_is_directory_error() {
        let executor = ScriptedExecutor::default().respond(CommandOutput {
            exit_code: Some(0),
            stdout: "total 0\nsh: ls: applet not found\ngarbage\n".to_string(),
            stderr: String::new(),
        });

        let listed = list_dir(
            &executor,
            &ResourceRef::new("ns1", "api-7f"),
            &ContainerRef::new("api"),
            "/srv",
        )
        .await;

        match listed {
            Err(NavError::DirectoryList { path, detail }) => {
                assert_eq!(path, "/srv");
                assert!(detail.contains("applet not found"));
            }
            other => panic!("expected directory list error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn dot_entries_only_is_empty_directory() {
        let executor = ScriptedExecutor::default().respond(CommandOutput {
            exit_code: Some(0),
            stdout: "\
total 8
drwxr-xr-x 2 root root 4096 Mar  3 10:00 .
drwxr-xr-x 1 root root 4096 Mar  3 10:00 ..
"
            .to_string(),
            stderr: String::new(),
        });

        let listed = list_dir(
            &executor,
            &ResourceRef::new("ns1", "api-7f"),
            &ContainerRef::new("api"),
            "/tmp/empty",
        )
        .await
        .expect("dot-only listing");

        assert!(listed.is_empty());
    }

    #[test]
    fn menu_offers_parent_only_below_root() {
        let entries = vec![DirEntry::dir("logs"), DirEntry::file("app.conf")];
        let labels = |choices: Vec<(String, BrowseChoice)>| {
            choices.into_iter().map(|(label, _)| label).collect::<Vec<_>>()
        };

        assert_eq!(
            labels(menu_choices(&root(), entries.clone())),
            vec!["logs/", "app.conf", SELECT_LABEL]
        );

        let nested = root().descend(&DirEntry::dir("srv"));
        assert_eq!(
            labels(menu_choices(&nested, entries)),
            vec![PARENT_LABEL, "logs/", "app.conf", SELECT_LABEL]
        );
    }

    #[test]
    fn descend_and_ascend_pairs_cancel_out() {
        let start = root().descend(&DirEntry::dir("srv"));
        let mut nav = start.clone();
        for name in ["a", "b", "c"] {
            nav = match apply_choice(nav, BrowseChoice::Enter(DirEntry::dir(name))) {
                BrowseState::NavigatingDown(nav, entry) => nav.descend(&entry),
                other => panic!("unexpected state {other:?}"),
            };
        }
        assert_eq!(nav.current_path(), "/srv/a/b/c");

        for _ in 0..3 {
            nav = match apply_choice(nav, BrowseChoice::Up) {
                BrowseState::NavigatingUp(nav) => nav.ascend(),
                other => panic!("unexpected state {other:?}"),
            };
        }
        assert_eq!(nav, start);
    }

    #[test]
    fn choosing_file_or_current_path_is_terminal() {
        let nav = root().descend(&DirEntry::dir("etc"));
        assert_eq!(
            apply_choice(nav.clone(), BrowseChoice::Enter(DirEntry::file("hosts"))),
            BrowseState::Selected("/etc/hosts".to_string())
        );
        assert_eq!(
            apply_choice(nav, BrowseChoice::SelectCurrent),
            BrowseState::Selected("/etc".to_string())
        );
    }

    #[tokio::test]
    async fn browse_descends_then_selects_file() {
        let executor = ScriptedExecutor::default()
            .respond(listing(&[("logs", true), ("app.conf", false)]))
            .respond(listing(&[("error.log", false)]));
        let mut prompter = ScriptedPrompter::default().pick("logs/").pick("error.log");

        let outcome = Browser::new(&executor, &mut prompter).browse(root()).await;

        assert_eq!(outcome, BrowseOutcome::Selected("/logs/error.log".to_string()));
        assert_eq!(executor.listed_paths(), vec!["/", "/logs"]);
    }

    #[tokio::test]
    async fn empty_directory_ascends_without_prompting() {
        let executor = ScriptedExecutor::default()
            .respond(listing(&[("tmp", true)]))
            .respond(listing(&[("empty", true)]))
            .respond(listing(&[]))
            .respond(listing(&[("empty", true)]));
        let mut prompter = ScriptedPrompter::default().pick("tmp/").pick("empty/").cancel();

        let outcome = Browser::new(&executor, &mut prompter).browse(root()).await;

        assert_eq!(outcome, BrowseOutcome::Cancelled);
        assert_eq!(
            executor.listed_paths(),
            vec!["/", "/tmp", "/tmp/empty", "/tmp"]
        );
        assert_eq!(prompter.menus.len(), 3);
        assert!(
            prompter
                .notices
                .iter()
                .any(|notice| notice.contains("/tmp/empty"))
        );
    }

    #[tokio::test]
    async fn listing_failure_below_root_ascends() {
        let executor = ScriptedExecutor::default()
            .respond(listing(&[("root", true)]))
            .respond_failure(2, "ls: can't open '/root': Permission denied")
            .respond(listing(&[("root", true)]));
        let mut prompter = ScriptedPrompter::default().pick("root/").pick(SELECT_LABEL);

        let outcome = Browser::new(&executor, &mut prompter).browse(root()).await;

        assert_eq!(outcome, BrowseOutcome::Selected("/".to_string()));
        assert!(
            prompter
                .notices
                .iter()
                .any(|notice| notice.contains("Permission denied"))
        );
    }

    #[tokio::test]
    async fn empty_root_cancels() {
        let executor = ScriptedExecutor::default().respond(listing(&[]));
        let mut prompter = ScriptedPrompter::default();

        let outcome = Browser::new(&executor, &mut prompter).browse(root()).await;

        assert_eq!(outcome, BrowseOutcome::Cancelled);
        assert!(prompter.menus.is_empty());
    }

    #[tokio::test]
    async fn parent_entry_goes_up_one_level() {
        let executor = ScriptedExecutor::default()
            .respond(listing(&[("var", true)]))
            .respond(listing(&[("log", true)]))
            .respond(listing(&[("var", true)]));
        let mut prompter = ScriptedPrompter::default()
            .pick("var/")
            .pick(PARENT_LABEL)
            .cancel();

        let outcome = Browser::new(&executor, &mut prompter).browse(root()).await;

        assert_eq!(outcome, BrowseOutcome::Cancelled);
        assert_eq!(executor.listed_paths(), vec!["/", "/var", "/"]);
    }
}
