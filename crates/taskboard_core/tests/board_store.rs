use taskboard_core::db::open_db_in_memory;
use taskboard_core::{
    ActivityKind, ActivityRepository, BoardRepository, ModelValidationError, Project, RepoError,
    SqliteActivityRepository, SqliteBoardRepository, SqliteWorkloadRepository, Task, TaskPriority,
    TaskStatus, Team, TeamMember, User, WorkloadRepository, WorkloadService,
};
use uuid::Uuid;

#[test]
fn create_task_round_trips_and_records_creation_activity() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteBoardRepository::try_new(&conn).unwrap();
    let owner = User::new("owner");
    repo.create_user(&owner).unwrap();
    let team_id = repo.create_team(&Team::new(owner.id, "core")).unwrap();
    let member_id = repo.add_member(&TeamMember::new(team_id, "ana", 3)).unwrap();
    let project_id = repo
        .create_project(&Project::new(owner.id, team_id, "alpha"))
        .unwrap();

    let task = Task::new(project_id, "  write docs ", TaskPriority::Medium).assigned_to(member_id);
    let task_id = repo.create_task(owner.id, &task).unwrap();

    let loaded = repo.get_task(task_id).unwrap().unwrap();
    assert_eq!(loaded.name, "write docs");
    assert_eq!(loaded.priority, TaskPriority::Medium);
    assert_eq!(loaded.status, TaskStatus::Pending);
    assert_eq!(loaded.assignee_id, Some(member_id));

    let history = SqliteActivityRepository::try_new(&conn)
        .unwrap()
        .list_task_activities(task_id)
        .unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].kind, ActivityKind::TaskCreated);
    assert_eq!(history[0].to_member_id, Some(member_id));
}

#[test]
fn status_change_is_audited_and_same_status_is_a_no_op() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteBoardRepository::try_new(&conn).unwrap();
    let owner = User::new("owner");
    repo.create_user(&owner).unwrap();
    let team_id = repo.create_team(&Team::new(owner.id, "core")).unwrap();
    let project_id = repo
        .create_project(&Project::new(owner.id, team_id, "alpha"))
        .unwrap();
    let task_id = repo
        .create_task(owner.id, &Task::new(project_id, "t", TaskPriority::Low))
        .unwrap();

    repo.update_task_status(owner.id, task_id, TaskStatus::InProgress)
        .unwrap();
    repo.update_task_status(owner.id, task_id, TaskStatus::InProgress)
        .unwrap();

    let history = SqliteActivityRepository::try_new(&conn)
        .unwrap()
        .list_task_activities(task_id)
        .unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].kind, ActivityKind::TaskStatusUpdated);
    assert_eq!(history[0].from_value.as_deref(), Some("pending"));
    assert_eq!(history[0].to_value.as_deref(), Some("in_progress"));

    let missing = repo.update_task_status(owner.id, Uuid::new_v4(), TaskStatus::Done);
    assert!(matches!(
        missing,
        Err(RepoError::NotFound { entity: "task", .. })
    ));
}

#[test]
fn blank_names_are_rejected_before_writing() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteBoardRepository::try_new(&conn).unwrap();

    let err = repo.create_user(&User::new("   ")).unwrap_err();
    assert!(matches!(
        err,
        RepoError::Validation(ModelValidationError::BlankName(_))
    ));
}

#[test]
fn project_must_be_staffed_by_a_team_of_the_same_owner() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteBoardRepository::try_new(&conn).unwrap();
    let owner = User::new("owner");
    let other = User::new("other");
    repo.create_user(&owner).unwrap();
    repo.create_user(&other).unwrap();
    let foreign_team = repo.create_team(&Team::new(other.id, "theirs")).unwrap();

    let err = repo
        .create_project(&Project::new(owner.id, foreign_team, "alpha"))
        .unwrap_err();
    assert!(matches!(err, RepoError::NotFound { entity: "team", .. }));
}

#[test]
fn member_toggle_and_listing_keep_creation_order() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteBoardRepository::try_new(&conn).unwrap();
    let owner = User::new("owner");
    repo.create_user(&owner).unwrap();
    let team_id = repo.create_team(&Team::new(owner.id, "core")).unwrap();
    let first = repo.add_member(&TeamMember::new(team_id, "first", 1)).unwrap();
    let second = repo.add_member(&TeamMember::new(team_id, "second", 2)).unwrap();

    repo.set_member_active(first, false).unwrap();

    let members = repo.list_members(team_id).unwrap();
    let ids: Vec<Uuid> = members.iter().map(|member| member.id).collect();
    assert_eq!(ids, vec![first, second]);
    assert!(!members[0].is_active);
    assert!(members[1].is_active);

    assert!(matches!(
        repo.set_member_active(Uuid::new_v4(), true),
        Err(RepoError::NotFound { .. })
    ));
}

#[test]
fn active_load_is_counted_across_projects_and_ignores_done_tasks() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteBoardRepository::try_new(&conn).unwrap();
    let owner = User::new("owner");
    repo.create_user(&owner).unwrap();
    let team_id = repo.create_team(&Team::new(owner.id, "core")).unwrap();
    let busy = repo.add_member(&TeamMember::new(team_id, "busy", 1)).unwrap();
    let idle = repo.add_member(&TeamMember::new(team_id, "idle", 1)).unwrap();
    let alpha = repo
        .create_project(&Project::new(owner.id, team_id, "alpha"))
        .unwrap();
    let beta = repo
        .create_project(&Project::new(owner.id, team_id, "beta"))
        .unwrap();
    repo.create_task(owner.id, &Task::new(alpha, "a", TaskPriority::Low).assigned_to(busy))
        .unwrap();
    repo.create_task(owner.id, &Task::new(beta, "b", TaskPriority::High).assigned_to(busy))
        .unwrap();
    let done = repo
        .create_task(owner.id, &Task::new(beta, "c", TaskPriority::Low).assigned_to(busy))
        .unwrap();
    repo.update_task_status(owner.id, done, TaskStatus::Done)
        .unwrap();
    repo.create_task(owner.id, &Task::new(beta, "unassigned", TaskPriority::Low))
        .unwrap();

    let workload = SqliteWorkloadRepository::try_new(&conn).unwrap();
    let loads = workload.count_active_load(&[busy, idle]).unwrap();
    assert_eq!(loads[&busy], 2);
    assert_eq!(loads[&idle], 0);

    let movable = workload.list_movable_tasks(beta).unwrap();
    assert_eq!(movable.len(), 1);
    assert_eq!(movable[0].name, "b");
}

#[test]
fn workload_overview_reports_cross_project_load_per_member() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteBoardRepository::try_new(&conn).unwrap();
    let owner = User::new("owner");
    repo.create_user(&owner).unwrap();
    let team_id = repo.create_team(&Team::new(owner.id, "core")).unwrap();
    let busy = repo.add_member(&TeamMember::new(team_id, "busy", 1)).unwrap();
    repo.add_member(&TeamMember::new(team_id, "idle", 2)).unwrap();
    let alpha = repo
        .create_project(&Project::new(owner.id, team_id, "alpha"))
        .unwrap();
    let beta = repo
        .create_project(&Project::new(owner.id, team_id, "beta"))
        .unwrap();
    repo.create_task(owner.id, &Task::new(alpha, "a", TaskPriority::Low).assigned_to(busy))
        .unwrap();
    repo.create_task(owner.id, &Task::new(beta, "b", TaskPriority::Low).assigned_to(busy))
        .unwrap();

    let service = WorkloadService::new(SqliteWorkloadRepository::try_new(&conn).unwrap());
    let overview = service.workload_overview(owner.id).unwrap();

    assert_eq!(overview.len(), 2);
    assert_eq!(overview[0].name, "alpha");
    for project in &overview {
        let busy_view = project
            .members
            .iter()
            .find(|member| member.member_id == busy)
            .unwrap();
        assert_eq!(busy_view.current_tasks, 2);
        assert!(busy_view.is_overloaded());
    }

    // The same member appears in both projects but is counted once.
    assert_eq!(service.overloaded_member_count(owner.id).unwrap(), 1);

    let stranger = Uuid::new_v4();
    assert!(service.workload_overview(stranger).unwrap().is_empty());
    assert_eq!(service.overloaded_member_count(stranger).unwrap(), 0);
}

#[test]
fn recent_reassignments_are_scoped_to_the_actor() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteBoardRepository::try_new(&conn).unwrap();
    let owner = User::new("owner");
    repo.create_user(&owner).unwrap();
    let team_id = repo.create_team(&Team::new(owner.id, "core")).unwrap();
    let project_id = repo
        .create_project(&Project::new(owner.id, team_id, "alpha"))
        .unwrap();
    repo.create_task(owner.id, &Task::new(project_id, "t", TaskPriority::Low))
        .unwrap();

    let activities = SqliteActivityRepository::try_new(&conn)
        .unwrap()
        .list_recent_reassignments(owner.id, Some(5))
        .unwrap();
    assert!(activities.is_empty());
}

#[test]
fn task_assignee_must_staff_the_project() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteBoardRepository::try_new(&conn).unwrap();
    let owner = User::new("owner");
    repo.create_user(&owner).unwrap();
    let core_team = repo.create_team(&Team::new(owner.id, "core")).unwrap();
    let other_team = repo.create_team(&Team::new(owner.id, "other")).unwrap();
    let outsider = repo
        .add_member(&TeamMember::new(other_team, "outsider", 3))
        .unwrap();
    let project_id = repo
        .create_project(&Project::new(owner.id, core_team, "alpha"))
        .unwrap();

    let task = Task::new(project_id, "t", TaskPriority::Low).assigned_to(outsider);
    let err = repo.create_task(owner.id, &task).unwrap_err();

    assert!(matches!(
        err,
        RepoError::NotFound { entity: "team member", id } if id == outsider
    ));
    assert!(repo.get_task(task.id).unwrap().is_none());
    let loads = SqliteWorkloadRepository::try_new(&conn)
        .unwrap()
        .count_active_load(&[outsider])
        .unwrap();
    assert_eq!(loads[&outsider], 0);
}
