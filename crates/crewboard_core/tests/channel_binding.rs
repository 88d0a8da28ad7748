use crewboard_core::binding::render::NONE_SET;
use crewboard_core::binding::MAIN_THREAD_NAME;
use crewboard_core::model::ids::{DepartmentId, StatusId};
use crewboard_core::model::project::ProjectDetails;
use crewboard_core::platform::{
    ChannelKind, ForumRequest, OverwriteTarget, Permission, RenderedMessage,
};
use crewboard_core::repo::{ProjectRepository, TaskRepository};
use crewboard_core::{
    BindingConfig, BindingError, ChannelBinding, ChannelId, ChatPlatform, InMemoryPlatform,
    MessageId, RepoError, Selector, SqliteEntityStore, TaskRequest, ValidationError,
};

fn setup() -> rusqlite::Connection {
    crewboard_core::db::open_db_in_memory().unwrap()
}

fn config() -> BindingConfig {
    BindingConfig {
        projects_category: Some(ChannelId(5)),
        ..BindingConfig::default()
    }
}

fn task_request(invoked_in: ChannelId, name: &str) -> TaskRequest {
    TaskRequest {
        invoked_in,
        name: name.to_string(),
        description: None,
        department: None,
        parent_thread: None,
        due_date: None,
    }
}

fn overview(platform: &InMemoryPlatform, thread: ChannelId) -> RenderedMessage {
    platform
        .message(MessageId(thread.0))
        .expect("overview message")
}

#[test]
fn create_project_builds_forum_tags_and_pinned_overview() {
    let conn = setup();
    let store = SqliteEntityStore::try_new(&conn).unwrap();
    let platform = InMemoryPlatform::new();
    let binding = ChannelBinding::new(&store, &platform, config());

    let mut details = ProjectDetails::new("Alpha Launch");
    details.docs_link = Some("https://docs.example/alpha".to_string());
    let project = binding.create_project(details).unwrap();

    let forum = platform.channel(project.forum_channel_id).unwrap();
    assert_eq!(forum.kind, ChannelKind::Forum);
    assert_eq!(forum.name, "alpha-launch");
    assert_eq!(forum.parent, Some(ChannelId(5)));

    let overwrites = platform.forum_overwrites(project.forum_channel_id);
    assert_eq!(overwrites.len(), 1);
    assert_eq!(overwrites[0].target, OverwriteTarget::Everyone);
    assert_eq!(overwrites[0].deny, vec![Permission::SendMessages]);

    let tags = platform.forum_tags(project.forum_channel_id);
    let tag_names: Vec<&str> = tags.iter().map(|tag| tag.name.as_str()).collect();
    assert_eq!(
        tag_names,
        ["Unassigned", "Assigned", "In Progress", "Stuck", "Feedback", "Complete"]
    );
    assert!(tags.iter().all(|tag| tag.moderated));
    assert_eq!(tags[5].emoji.as_deref(), Some("✅"));

    let thread = project.main_thread.thread_id();
    assert_eq!(platform.channel(thread).unwrap().name, MAIN_THREAD_NAME);
    assert!(platform.is_thread_pinned(thread));
    assert!(platform.is_message_pinned(project.main_thread.opening_message_id()));

    let message = overview(&platform, thread);
    assert_eq!(message.title, "Alpha Launch");
    assert_eq!(message.field("Documentation"), Some("https://docs.example/alpha"));
    assert_eq!(message.field("Total Tasks"), Some("0"));
    assert_eq!(message.field("Completed Tasks"), Some("0"));
    assert_eq!(message.field("Incomplete Tasks"), Some("0"));

    let stored = store
        .find_project(&Selector::External(project.forum_channel_id))
        .unwrap()
        .unwrap();
    assert_eq!(stored, project);
}

#[test]
fn rename_edits_forum_and_overview_in_place() {
    let conn = setup();
    let store = SqliteEntityStore::try_new(&conn).unwrap();
    let platform = InMemoryPlatform::new();
    let binding = ChannelBinding::new(&store, &platform, config());
    let project = binding
        .create_project(ProjectDetails::new("Alpha Launch"))
        .unwrap();
    let thread = project.main_thread.thread_id();

    let edited = binding
        .edit_project(
            &Selector::Internal(project.id),
            ProjectDetails::new("Alpha Launch 2"),
        )
        .unwrap();

    assert_eq!(edited.name, "Alpha Launch 2");
    assert_eq!(edited.main_thread, project.main_thread);
    assert_eq!(
        platform.channel(project.forum_channel_id).unwrap().name,
        "alpha-launch-2"
    );
    assert_eq!(platform.message_count(thread), 1);
    assert_eq!(platform.edit_count(project.main_thread.opening_message_id()), 1);
    assert_eq!(overview(&platform, thread).title, "Alpha Launch 2");
    assert_eq!(
        store.find_project_by_name("Alpha Launch 2").unwrap(),
        Some(edited)
    );
}

#[test]
fn duplicate_project_name_fails_before_any_platform_write() {
    let conn = setup();
    let store = SqliteEntityStore::try_new(&conn).unwrap();
    let platform = InMemoryPlatform::new();
    let binding = ChannelBinding::new(&store, &platform, config());
    binding.create_project(ProjectDetails::new("Rover")).unwrap();
    let writes = platform.write_count();

    let err = binding
        .create_project(ProjectDetails::new("  Rover "))
        .unwrap_err();
    assert!(matches!(
        err,
        BindingError::Repo(RepoError::UniquenessConflict(_))
    ));
    assert_eq!(platform.write_count(), writes);
}

#[test]
fn platform_failure_mid_create_persists_nothing() {
    let conn = setup();
    let store = SqliteEntityStore::try_new(&conn).unwrap();
    let platform = InMemoryPlatform::new();
    platform.fail_operation("create_thread");
    let binding = ChannelBinding::new(&store, &platform, config());

    let err = binding
        .create_project(ProjectDetails::new("Rover"))
        .unwrap_err();
    assert!(matches!(err, BindingError::Platform(_)));
    assert!(store.list_projects().unwrap().is_empty());
}

#[test]
fn task_is_created_in_the_forum_of_the_invoking_thread() {
    let conn = setup();
    let store = SqliteEntityStore::try_new(&conn).unwrap();
    let platform = InMemoryPlatform::new();
    let binding = ChannelBinding::new(&store, &platform, config());
    let project = binding.create_project(ProjectDetails::new("Rover")).unwrap();
    let main = project.main_thread.thread_id();

    let mut request = task_request(main, "Chassis");
    request.department = Some(DepartmentId(1));
    request.due_date = Some("2026-12-01".to_string());
    let parent = binding.create_task(&request).unwrap();

    let mut request = task_request(parent.thread_channel_id, "Wheels");
    request.parent_thread = Some(parent.thread_channel_id);
    let child = binding.create_task(&request).unwrap();

    assert_eq!(child.project_id, project.id);
    assert_eq!(child.parent_task_id, Some(parent.id));
    let thread = platform.channel(child.thread_channel_id).unwrap();
    assert_eq!(thread.parent, Some(project.forum_channel_id));
    assert_eq!(thread.name, "Wheels");

    let card = platform
        .message(MessageId(child.thread_channel_id.0))
        .unwrap();
    assert_eq!(
        card.field("Parent Task"),
        Some(parent.thread_channel_id.mention().as_str())
    );
    assert_eq!(card.field("Due Date"), Some(NONE_SET));
    assert!(platform.is_message_pinned(MessageId(child.thread_channel_id.0)));

    let parent_card = platform
        .message(MessageId(parent.thread_channel_id.0))
        .unwrap();
    assert_eq!(parent_card.field("Department"), Some("Mechanic"));
    assert_eq!(parent_card.field("Due Date"), Some("2026-12-01"));
}

#[test]
fn parent_task_from_another_project_is_rejected_before_writes() {
    let conn = setup();
    let store = SqliteEntityStore::try_new(&conn).unwrap();
    let platform = InMemoryPlatform::new();
    let binding = ChannelBinding::new(&store, &platform, config());
    let rover = binding.create_project(ProjectDetails::new("Rover")).unwrap();
    let drone = binding.create_project(ProjectDetails::new("Drone")).unwrap();
    let foreign = binding
        .create_task(&task_request(drone.main_thread.thread_id(), "Props"))
        .unwrap();
    let writes = platform.write_count();

    let mut request = task_request(rover.main_thread.thread_id(), "Wheels");
    request.parent_thread = Some(foreign.thread_channel_id);
    let err = binding.create_task(&request).unwrap_err();

    assert!(matches!(
        err,
        BindingError::Validation(ValidationError::InvalidParentTask(thread))
            if thread == foreign.thread_channel_id
    ));
    assert_eq!(platform.write_count(), writes);
    assert!(store.list_tasks(rover.id).unwrap().is_empty());
}

#[test]
fn unknown_department_is_rejected() {
    let conn = setup();
    let store = SqliteEntityStore::try_new(&conn).unwrap();
    let platform = InMemoryPlatform::new();
    let binding = ChannelBinding::new(&store, &platform, config());
    let project = binding.create_project(ProjectDetails::new("Rover")).unwrap();

    let mut request = task_request(project.main_thread.thread_id(), "Chassis");
    request.department = Some(DepartmentId(99));
    assert!(matches!(
        binding.create_task(&request),
        Err(BindingError::Validation(ValidationError::UnknownDepartment(
            DepartmentId(99)
        )))
    ));
}

#[test]
fn project_resolution_needs_a_thread_inside_a_project_forum() {
    let conn = setup();
    let store = SqliteEntityStore::try_new(&conn).unwrap();
    let platform = InMemoryPlatform::new();
    let binding = ChannelBinding::new(&store, &platform, config());
    let project = binding.create_project(ProjectDetails::new("Rover")).unwrap();

    let lobby = platform.add_text_channel("lobby");
    assert!(matches!(
        binding.resolve_project(lobby),
        Err(BindingError::Validation(ValidationError::OutsideProjectForum(_)))
    ));
    assert!(matches!(
        binding.resolve_project(project.forum_channel_id),
        Err(BindingError::Validation(ValidationError::OutsideProjectForum(_)))
    ));

    let stray_forum = platform
        .create_forum(&ForumRequest {
            name: "stray".to_string(),
            category: None,
            overwrites: Vec::new(),
        })
        .unwrap();
    let stray_thread = platform
        .create_thread(stray_forum, "chat", &overview(&platform, project.main_thread.thread_id()))
        .unwrap();
    assert!(matches!(
        binding.resolve_project(stray_thread.thread),
        Err(BindingError::Validation(ValidationError::NotAProjectChannel(forum)))
            if forum == stray_forum
    ));
}

#[test]
fn resolution_fetches_uncached_channels() {
    let conn = setup();
    let store = SqliteEntityStore::try_new(&conn).unwrap();
    let platform = InMemoryPlatform::new();
    let binding = ChannelBinding::new(&store, &platform, config());
    let project = binding.create_project(ProjectDetails::new("Rover")).unwrap();
    let thread = project.main_thread.thread_id();

    platform.evict_from_cache(thread);
    platform.evict_from_cache(project.forum_channel_id);
    let resolved = binding.resolve_project(thread).unwrap();
    assert_eq!(resolved.id, project.id);
    assert_eq!(platform.fetch_count(), 2);
}

#[test]
fn refresh_overview_recomputes_counters() {
    let conn = setup();
    let store = SqliteEntityStore::try_new(&conn).unwrap();
    let platform = InMemoryPlatform::new();
    let binding = ChannelBinding::new(&store, &platform, config());
    let project = binding.create_project(ProjectDetails::new("Rover")).unwrap();
    let main = project.main_thread.thread_id();

    let mut first = binding.create_task(&task_request(main, "A")).unwrap();
    binding.create_task(&task_request(main, "B")).unwrap();
    first.status_id = Some(StatusId(6));
    store.update_task(&first).unwrap();

    let counters = binding.refresh_overview(project.id).unwrap();
    assert_eq!((counters.total, counters.completed), (2, 1));
    let message = overview(&platform, main);
    assert_eq!(message.field("Total Tasks"), Some("2"));
    assert_eq!(message.field("Completed Tasks"), Some("1"));
    assert_eq!(message.field("Incomplete Tasks"), Some("1"));
}
