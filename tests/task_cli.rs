mod support;

use predicates::str::contains;
use serde_json::Value;

use support::TestBoard;

#[test]
fn help_lists_commands() {
    support::taskboard_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(contains("task board"))
        .stdout(contains("serve"));

    for cmd in ["list", "add", "show", "edit", "rm", "serve"] {
        support::taskboard_cmd()
            .arg(cmd)
            .arg("--help")
            .assert()
            .success();
    }
}

#[test]
fn add_then_show_round_trips() -> Result<(), Box<dyn std::error::Error>> {
    let board = TestBoard::new();

    let created = board.json(&[
        "add",
        "Write report",
        "--details",
        "quarterly numbers",
        "--priority",
        "High",
        "--status",
        "In Progress",
        "--due",
        "2099-01-01T00:00:00Z",
    ]);
    assert_eq!(created["schema_version"], "taskboard.v1");
    assert_eq!(created["command"], "add");
    let task = &created["data"];
    assert_eq!(task["heading"], "Write report");
    assert_eq!(task["details"], "quarterly numbers");
    assert_eq!(task["status"], "In Progress");
    assert_eq!(task["priority"], "High");
    assert_eq!(task["urgency"], "none");
    assert_eq!(task["isOverdue"], false);
    let id = task["id"].as_str().ok_or("missing id")?;

    let shown = board.json(&["show", id]);
    assert_eq!(shown["data"], *task);

    let raw = std::fs::read_to_string(board.store_path())?;
    assert!(raw.contains(id));
    Ok(())
}

#[test]
fn add_defaults_and_human_output() {
    let board = TestBoard::new();

    board
        .cmd()
        .args(["add", "Plain task"])
        .assert()
        .success()
        .stdout(contains("Task created"))
        .stdout(contains("- Status: To Do"))
        .stdout(contains("- Priority: Low"))
        .stdout(contains("taskboard show "));
}

#[test]
fn quiet_suppresses_human_output() {
    let board = TestBoard::new();
    board
        .cmd()
        .args(["add", "Silent", "--quiet"])
        .assert()
        .success()
        .stdout("");
}

#[test]
fn validation_errors_exit_with_user_error() {
    let board = TestBoard::new();

    board
        .cmd()
        .args(["add", "   ", "--priority", "Urgent"])
        .assert()
        .code(2)
        .stderr(contains("error: Validation failed"))
        .stderr(contains("heading: heading is required"))
        .stderr(contains("'Urgent' is not a valid priority"));

    let envelope = board.json(&["add", "Late", "--due", "2000-01-01"]);
    assert_eq!(envelope["status"], "error");
    assert_eq!(envelope["error"]["kind"], "validation_failed");
    assert_eq!(envelope["error"]["code"], 2);
    assert_eq!(envelope["error"]["details"][0]["field"], "dueDate");
}

#[test]
fn list_pages_filters_and_sorts() {
    let board = TestBoard::new();
    for n in 0..12 {
        let status = if n % 3 == 0 { "Done" } else { "To Do" };
        board.add(&[&format!("task {n:02}"), "--status", status]);
    }

    let page = board.json(&["list", "--limit", "5", "--page", "3"]);
    let data = &page["data"];
    assert_eq!(data["tasks"].as_array().map(Vec::len), Some(2));
    assert_eq!(data["pagination"]["totalItems"], 12);
    assert_eq!(data["pagination"]["totalPages"], 3);
    assert_eq!(data["pagination"]["hasNextPage"], false);
    assert_eq!(data["pagination"]["hasPrevPage"], true);

    let done = board.json(&[
        "list",
        "--status",
        "Done",
        "--sort-by",
        "heading",
        "--sort-order",
        "asc",
    ]);
    let headings: Vec<&str> = done["data"]["tasks"]
        .as_array()
        .expect("tasks")
        .iter()
        .filter_map(|task| task["heading"].as_str())
        .collect();
    assert_eq!(headings, vec!["task 00", "task 03", "task 06", "task 09"]);
}

#[test]
fn list_rejects_bad_parameters() {
    let board = TestBoard::new();
    let envelope = board.json(&["list", "--limit", "101", "--sort-by", "title"]);
    assert_eq!(envelope["error"]["kind"], "invalid_parameter");
    let fields: Vec<&str> = envelope["error"]["details"]
        .as_array()
        .expect("details")
        .iter()
        .filter_map(|detail| detail["field"].as_str())
        .collect();
    assert_eq!(fields, vec!["limit", "sortBy"]);
}

#[test]
fn edit_changes_only_supplied_fields() {
    let board = TestBoard::new();
    let id = board.add(&[
        "Draft",
        "--details",
        "first pass",
        "--priority",
        "Medium",
        "--due",
        "2099-06-01",
    ]);

    let edited = board.json(&["edit", &id, "--status", "Done", "--details", ""]);
    let task = &edited["data"];
    assert_eq!(task["heading"], "Draft");
    assert_eq!(task["status"], "Done");
    assert_eq!(task["priority"], "Medium");
    assert_eq!(task["dueDate"], "2099-06-01T00:00:00Z");
    assert!(task.get("details").is_none());

    let cleared = board.json(&["edit", &id, "--clear-due"]);
    assert!(cleared["data"].get("dueDate").is_none());
}

#[test]
fn rm_twice_reports_not_found() {
    let board = TestBoard::new();
    let id = board.add(&["Temporary"]);

    let removed = board.json(&["rm", &id]);
    assert_eq!(removed["data"]["id"], Value::String(id.clone()));
    assert_eq!(removed["data"]["message"], "Task deleted successfully");

    board
        .cmd()
        .args(["rm", &id])
        .assert()
        .code(3)
        .stderr(contains("Task not found"));
}

#[test]
fn malformed_id_is_user_error() {
    let board = TestBoard::new();
    let envelope = board.json(&["show", "not-a-task-id"]);
    assert_eq!(envelope["error"]["kind"], "invalid_id");
    assert_eq!(envelope["error"]["code"], 2);
}

#[test]
fn corrupt_store_is_operation_failure() -> Result<(), Box<dyn std::error::Error>> {
    let board = TestBoard::new();
    std::fs::write(board.store_path(), "{ not json")?;
    board
        .cmd()
        .arg("list")
        .assert()
        .code(4)
        .stderr(contains("Task storage unavailable"));
    Ok(())
}

#[test]
fn store_path_comes_from_config() -> Result<(), Box<dyn std::error::Error>> {
    let board = TestBoard::new();
    let store = board.path().join("configured").join("board.json");
    let config = board.write_config(&format!(
        "[storage]\npath = {:?}\n",
        store.to_string_lossy()
    ))?;

    support::taskboard_cmd()
        .current_dir(board.path())
        .env_remove("TASKBOARD_STORE")
        .args(["add", "From config", "--config"])
        .arg(&config)
        .assert()
        .success();
    assert!(store.exists());
    Ok(())
}

#[test]
fn explicit_invalid_config_fails() -> Result<(), Box<dyn std::error::Error>> {
    let board = TestBoard::new();
    let config = board.write_config("[server]\nport = 0\n")?;
    board
        .cmd()
        .args(["list", "--config"])
        .arg(&config)
        .assert()
        .code(2)
        .stderr(contains("server.port"));
    Ok(())
}
