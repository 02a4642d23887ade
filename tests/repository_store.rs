use chrono::NaiveDate;
use ticker::config::TasksConfig;
use ticker::task::{GroupFilter, SortKey, StatusFilter};
use ticker::{Error, JsonFileStore, NewTask, TaskRepository, TaskStatus, TaskStore};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("date")
}

fn open(dir: &tempfile::TempDir) -> TaskRepository<JsonFileStore> {
    let store = JsonFileStore::new(
        dir.path().join("tasks.json"),
        dir.path().join("tasks_backup.json"),
    );
    TaskRepository::open(store, TasksConfig::default())
}

#[test]
fn state_survives_reopen() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let (a, c) = {
        let mut repo = open(&dir);
        let a = repo.add(NewTask::new("A", date(2025, 1, 10)).group("work"))?.value;
        let c = repo
            .add(
                NewTask::new("C", date(2025, 1, 15))
                    .sequence(4)
                    .depends_on(a.id.clone()),
            )?
            .value;
        repo.toggle_status(&a.id)?;
        (a, c)
    };

    let repo = open(&dir);
    assert_eq!(repo.len(), 2);
    let a_loaded = repo.get(&a.id).ok_or("A")?;
    assert_eq!(a_loaded.status, TaskStatus::Done);
    assert_eq!(a_loaded.group, "Work");
    assert_eq!(a_loaded.created_at, a.created_at);
    let c_loaded = repo.get(&c.id).ok_or("C")?;
    assert_eq!(c_loaded, &c);
    assert!(!repo.is_blocked(c_loaded));
    Ok(())
}

#[test]
fn sorted_order_is_persisted_on_next_save() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    {
        let mut repo = open(&dir);
        repo.add(NewTask::new("Late", date(2025, 6, 1)))?;
        let early = repo.add(NewTask::new("Early", date(2025, 1, 1)))?.value;
        repo.sort(SortKey::DueDate);
        repo.toggle_status(&early.id)?;
    }

    let mut repo = open(&dir);
    let titles: Vec<String> = repo
        .filter(StatusFilter::All, GroupFilter::All)
        .into_iter()
        .map(|task| task.title.clone())
        .collect();
    assert_eq!(titles, vec!["Early", "Late"]);
    Ok(())
}

#[test]
fn positional_selection_after_filter() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let mut repo = open(&dir);
    repo.add(NewTask::new("One", date(2025, 1, 1)).group("home"))?;
    repo.add(NewTask::new("Two", date(2025, 1, 2)).group("work"))?;

    repo.filter(StatusFilter::Pending, GroupFilter::parse("Work"));
    let id = repo.task_at(0)?.id.clone();
    repo.toggle_status(&id)?;

    assert!(matches!(repo.task_at(0), Err(Error::StaleView)));
    assert!(repo
        .filter(StatusFilter::Pending, GroupFilter::parse("Work"))
        .is_empty());
    Ok(())
}

#[test]
fn backup_holds_previous_generation() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let mut repo = open(&dir);
    repo.add(NewTask::new("First", date(2025, 1, 1)))?;
    repo.add(NewTask::new("Second", date(2025, 1, 2)))?;

    let backup = JsonFileStore::new(
        dir.path().join("tasks_backup.json"),
        dir.path().join("unused.json"),
    );
    let previous = backup.load()?;
    assert_eq!(previous.len(), 1);
    assert_eq!(previous[0].title, "First");
    Ok(())
}
