//! End-to-end tests for the subcommand handlers.
//!
//! Each test runs commands against a project file in a temporary directory,
//! feeding menu answers through an in-memory prompt.

use clap::Parser;
use planit::cli::commands;
use planit::cli::prompt::Prompt;
use planit::cli::{Cli, Command};
use planit::config::Config;
use planit::store::TaskStore;
use tempfile::TempDir;

fn setup() -> (TempDir, Config) {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let mut config = Config::default();
    config.project.file = dir.path().join(".planit.json");
    config.project.name = "cli".to_string();
    (dir, config)
}

fn parse(args: &[&str]) -> Command {
    let argv = std::iter::once("planit").chain(args.iter().copied());
    Cli::try_parse_from(argv)
        .expect("Failed to parse arguments")
        .command
        .expect("No subcommand")
}

/// Run one command with `input` as the user's answers; returns the output.
fn run(config: &Config, args: &[&str], input: &str) -> anyhow::Result<String> {
    let mut prompt = Prompt::new(input.as_bytes(), Vec::new());
    commands::run(parse(args), config, &mut prompt)?;
    Ok(String::from_utf8(prompt.into_output()).expect("Output is not UTF-8"))
}

fn init(config: &Config) {
    run(config, &["init"], "").expect("Failed to init");
}

fn load(config: &Config) -> TaskStore {
    TaskStore::load(&config.project.file).expect("Failed to load project")
}

mod init_tests {
    use super::*;

    #[test]
    fn init_creates_document_once() {
        let (_dir, config) = setup();

        let out = run(&config, &["init"], "").unwrap();
        assert!(out.starts_with("Project initialized in"));
        assert_eq!(load(&config).project_name(), "cli");

        assert!(run(&config, &["init"], "").is_err());
    }

    #[test]
    fn commands_without_project_fail() {
        let (_dir, config) = setup();
        let err = run(&config, &["list"], "").unwrap_err();
        assert!(err.to_string().contains("not found"));
    }
}

mod task_tests {
    use super::*;

    #[test]
    fn task_at_root_and_under_parent() {
        let (_dir, config) = setup();
        init(&config);

        let out = run(&config, &["task", "Backend", "--root"], "").unwrap();
        assert_eq!(out, "Task created: Backend\n");

        let out = run(&config, &["task", "API", "-p", "backend", "-d", "REST"], "").unwrap();
        assert_eq!(out, "Subtask created: API (of Backend)\n");

        let store = load(&config);
        let backend = store.find_by_exact_name("Backend").unwrap();
        let api = store.find_by_exact_name("API").unwrap();
        assert_eq!(api.parent_id.as_deref(), Some(backend.id.as_str()));
        assert_eq!(api.description, "REST");
    }

    #[test]
    fn task_picks_parent_from_menu() {
        let (_dir, config) = setup();
        init(&config);
        run(&config, &["task", "Backend", "--root"], "").unwrap();

        let out = run(&config, &["task", "API"], "1\n").unwrap();
        assert!(out.contains("0. Root level (no parent)"));
        assert!(out.contains("Subtask created: API (of Backend)"));

        let out = run(&config, &["task", "Docs"], "0\n").unwrap();
        assert!(out.contains("Task created: Docs"));
        assert_eq!(load(&config).roots().len(), 2);
    }

    #[test]
    fn task_with_existing_name_activates_it() {
        let (_dir, config) = setup();
        init(&config);
        run(&config, &["task", "Backend", "--root"], "").unwrap();

        let out = run(&config, &["task", "BACKEND"], "").unwrap();
        assert_eq!(out, "Task activated: Backend\n");

        let store = load(&config);
        assert_eq!(store.len(), 1);
        assert_eq!(store.active_tasks()[0].title, "Backend");
    }

    #[test]
    fn unknown_parent_name_is_an_error() {
        let (_dir, config) = setup();
        init(&config);
        let err = run(&config, &["task", "API", "-p", "Nope"], "").unwrap_err();
        assert_eq!(err.to_string(), "Task 'Nope' not found");
        assert!(load(&config).is_empty());
    }
}

mod status_tests {
    use super::*;

    fn seeded() -> (TempDir, Config) {
        let (dir, config) = setup();
        init(&config);
        run(&config, &["task", "Backend", "--root"], "").unwrap();
        run(&config, &["task", "API", "-p", "Backend"], "").unwrap();
        run(&config, &["task", "Docs", "--root"], "").unwrap();
        (dir, config)
    }

    #[test]
    fn done_by_name_cascades() {
        let (_dir, config) = seeded();

        let out = run(&config, &["done", "backend"], "").unwrap();
        assert_eq!(out, "Task marked as completed: Backend\n");

        let store = load(&config);
        assert!(store.find_by_exact_name("API").unwrap().completed);
        assert!(!store.find_by_exact_name("Docs").unwrap().completed);
    }

    #[test]
    fn done_from_menu_numbers_eligible_tasks() {
        let (_dir, config) = seeded();
        run(&config, &["done", "Docs"], "").unwrap();

        let out = run(&config, &["done"], "2\n").unwrap();
        assert!(out.contains("1. ◯ Backend"));
        assert!(out.contains("2. ◯   API"));
        assert!(!out.contains("Docs ["));
        assert!(out.contains("Task marked as completed: API"));
    }

    #[test]
    fn invalid_and_cancelled_selections_change_nothing() {
        let (_dir, config) = seeded();

        let out = run(&config, &["done"], "9\n").unwrap();
        assert!(out.ends_with("Invalid selection\n"));

        let out = run(&config, &["done"], "q\n").unwrap();
        assert!(out.ends_with("Operation cancelled\n"));

        assert!(load(&config).tasks().all(|t| !t.completed));
    }

    #[test]
    fn unknown_name_is_an_error() {
        let (_dir, config) = seeded();
        let err = run(&config, &["done", "Nope"], "").unwrap_err();
        assert_eq!(err.to_string(), "Task 'Nope' not found");
    }

    #[test]
    fn take_and_untake() {
        let (_dir, config) = seeded();

        run(&config, &["take", "API"], "").unwrap();
        run(&config, &["take", "Docs"], "").unwrap();
        assert_eq!(load(&config).active_tasks().len(), 2);

        // Ineligible rows are listed without a number.
        let out = run(&config, &["untake"], "2\n").unwrap();
        assert!(out.contains("1. *   API"));
        assert!(out.contains("2. * Docs"));
        assert!(out.contains("Task deactivated: Docs"));

        let store = load(&config);
        let active: Vec<&str> = store.active_tasks().iter().map(|t| t.title.as_str()).collect();
        assert_eq!(active, vec!["API"]);
    }

    #[test]
    fn take_of_completed_task_is_rejected() {
        let (_dir, config) = seeded();
        run(&config, &["done", "Docs"], "").unwrap();

        let err = run(&config, &["take", "Docs"], "").unwrap_err();
        assert!(err.to_string().contains("Cannot activate completed task"));
    }

    #[test]
    fn clean_hides_from_default_listing() {
        let (_dir, config) = seeded();
        run(&config, &["clean", "Backend"], "").unwrap();

        let out = run(&config, &["list", "--simple"], "").unwrap();
        assert!(out.contains("Docs"));
        assert!(!out.contains("Backend"));

        let out = run(&config, &["list", "--all", "--simple"], "").unwrap();
        assert!(out.contains("C Backend"));
        assert!(out.contains("C   API"));

        let out = run(&config, &["unclean", "Backend"], "").unwrap();
        assert_eq!(out, "Task marked as not clean: Backend\n");
        assert!(load(&config).tasks().all(|t| !t.clean));
    }
}

mod structure_tests {
    use super::*;

    #[test]
    fn delete_removes_subtree() {
        let (_dir, config) = setup();
        init(&config);
        run(&config, &["task", "Backend", "--root"], "").unwrap();
        run(&config, &["task", "API", "-p", "Backend"], "").unwrap();

        let out = run(&config, &["delete", "Backend"], "").unwrap();
        assert_eq!(out, "Task deleted: Backend (2 total)\n");
        assert!(load(&config).is_empty());
    }

    #[test]
    fn move_with_flags() {
        let (_dir, config) = setup();
        init(&config);
        run(&config, &["task", "A", "--root"], "").unwrap();
        run(&config, &["task", "B", "--root"], "").unwrap();
        run(&config, &["task", "C", "-p", "A"], "").unwrap();

        let out = run(&config, &["move", "C", "--to", "B"], "").unwrap();
        assert_eq!(out, "Task moved: C (under B)\n");

        let out = run(&config, &["move", "C", "--root"], "").unwrap();
        assert_eq!(out, "Task moved to root level: C\n");
        assert_eq!(load(&config).roots().len(), 3);
    }

    #[test]
    fn move_menu_does_not_offer_own_subtree() {
        let (_dir, config) = setup();
        init(&config);
        run(&config, &["task", "A", "--root"], "").unwrap();
        run(&config, &["task", "B", "-p", "A"], "").unwrap();
        run(&config, &["task", "Other", "--root"], "").unwrap();

        // A and B are shown for context; Other is the only numbered parent.
        let out = run(&config, &["move", "A"], "1\n").unwrap();
        assert!(out.contains("1. ◯ Other"));
        assert!(out.contains("Task moved: A (under Other)"));

        let store = load(&config);
        let other = store.find_by_exact_name("Other").unwrap();
        assert_eq!(store.subtasks(&other.id)[0].title, "A");
    }

    #[test]
    fn move_into_descendant_by_name_fails() {
        let (_dir, config) = setup();
        init(&config);
        run(&config, &["task", "A", "--root"], "").unwrap();
        run(&config, &["task", "B", "-p", "A"], "").unwrap();

        let err = run(&config, &["move", "A", "--to", "B"], "").unwrap_err();
        assert!(err.to_string().contains("own descendant"));
        assert_eq!(load(&config).roots().len(), 1);
    }
}

mod listing_tests {
    use super::*;

    #[test]
    fn empty_views_print_their_message() {
        let (_dir, config) = setup();
        init(&config);

        assert_eq!(run(&config, &["list"], "").unwrap(), "No tasks in the project\n");
        assert_eq!(
            run(&config, &["active"], "").unwrap(),
            "No active tasks in the project\n"
        );
        assert_eq!(
            run(&config, &["done"], "").unwrap(),
            "No incomplete tasks in the project\n"
        );
    }

    #[test]
    fn active_view_shows_parents_for_context() {
        let (_dir, config) = setup();
        init(&config);
        run(&config, &["task", "Backend", "--root"], "").unwrap();
        run(&config, &["task", "API", "-p", "Backend"], "").unwrap();
        run(&config, &["task", "Docs", "--root"], "").unwrap();
        run(&config, &["take", "API"], "").unwrap();

        let out = run(&config, &["active"], "").unwrap();
        assert!(out.contains("Active tasks:"));
        assert!(out.contains("Backend"));
        assert!(out.contains("API"));
        assert!(!out.contains("Docs"));
    }

    #[test]
    fn json_listing_carries_depth_and_active() {
        let (_dir, config) = setup();
        init(&config);
        run(&config, &["task", "Backend", "--root"], "").unwrap();
        run(&config, &["task", "API", "-p", "Backend"], "").unwrap();
        run(&config, &["take", "API"], "").unwrap();

        let out = run(&config, &["list", "--json"], "").unwrap();
        let rows: serde_json::Value = serde_json::from_str(&out).unwrap();

        assert_eq!(rows[0]["title"], "Backend");
        assert_eq!(rows[0]["depth"], 0);
        assert_eq!(rows[1]["title"], "API");
        assert_eq!(rows[1]["depth"], 1);
        assert_eq!(rows[1]["active"], true);
    }

    #[test]
    fn find_matches_substrings() {
        let (_dir, config) = setup();
        init(&config);
        run(&config, &["task", "Write docs", "--root"], "").unwrap();
        run(&config, &["task", "Review docs", "--root"], "").unwrap();
        run(&config, &["task", "Deploy", "--root"], "").unwrap();

        let out = run(&config, &["find", "DOCS"], "").unwrap();
        assert_eq!(out.lines().count(), 2);

        let out = run(&config, &["find", "zzz"], "").unwrap();
        assert_eq!(out, "No tasks matching 'zzz'\n");
    }
}
