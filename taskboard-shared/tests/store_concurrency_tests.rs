/// Concurrency tests for the in-memory store and the update protocol
///
/// Many tasks race on the same row; the conditional update must let exactly
/// one writer per version through.

use futures::future::join_all;
use std::sync::Arc;
use taskboard_shared::concurrency::{update_task, UpdateError};
use taskboard_shared::models::{CreateProject, CreateTask, CreateUser, Role, Task, TaskPatch, User};
use taskboard_shared::store::{MemoryStore, Store, UpdateCondition};

async fn seeded() -> (Arc<MemoryStore>, User, Task) {
    let store = Arc::new(MemoryStore::new());
    let admin = store
        .create_user(CreateUser {
            name: "Admin".to_string(),
            email: "admin@demo.test".to_string(),
            password_hash: "hash".to_string(),
            role: Role::Admin,
        })
        .await
        .unwrap();
    let project = store
        .create_project(CreateProject {
            name: "Website Redesign".to_string(),
            description: None,
        })
        .await
        .unwrap();
    let task = store
        .create_task(CreateTask {
            project_id: project.id,
            title: "Implement backend".to_string(),
            assignee_user_id: admin.id,
            due_date: None,
        })
        .await
        .unwrap();

    (store, admin, task)
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_same_version_race_has_one_winner() {
    let (store, _, task) = seeded().await;

    let handles = (0..16).map(|i| {
        let store = Arc::clone(&store);
        tokio::spawn(async move {
            let patch = TaskPatch {
                title: Some(format!("Writer {}", i)),
                ..Default::default()
            };
            let condition = UpdateCondition {
                expected_version: 1,
                assignee: None,
            };
            store.update_task_if(task.id, condition, &patch).await
        })
    });

    let results = join_all(handles).await;
    let winners = results
        .into_iter()
        .map(|joined| joined.expect("Task panicked").expect("Store error"))
        .filter(Option::is_some)
        .count();

    assert_eq!(winners, 1);
    assert_eq!(store.find_task(task.id).await.unwrap().unwrap().version, 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_controller_race_reports_conflicts() {
    let (store, admin, task) = seeded().await;

    let handles = (0..8).map(|_| {
        let store = Arc::clone(&store);
        let admin = admin.clone();
        tokio::spawn(async move {
            update_task(store.as_ref(), &admin, task.id, 1, TaskPatch::default()).await
        })
    });

    let mut ok = 0;
    let mut conflicts = 0;
    for joined in join_all(handles).await {
        match joined.expect("Task panicked") {
            Ok(updated) => {
                assert_eq!(updated.version, 2);
                ok += 1;
            }
            Err(UpdateError::Conflict { expected, current }) => {
                assert_eq!(expected, 1);
                assert_eq!(current, 2);
                conflicts += 1;
            }
            Err(other) => panic!("Unexpected error: {}", other),
        }
    }

    assert_eq!(ok, 1);
    assert_eq!(conflicts, 7);
}

#[tokio::test]
async fn test_sequential_updates_increment_version() {
    let (store, admin, task) = seeded().await;
    let updates = 10;

    let mut version = task.version;
    for _ in 0..updates {
        version = update_task(store.as_ref(), &admin, task.id, version, TaskPatch::default())
            .await
            .unwrap()
            .version;
    }

    assert_eq!(version, 1 + updates);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_retrying_writers_all_land_eventually() {
    let (store, admin, task) = seeded().await;
    let writers = 6;

    let handles = (0..writers).map(|_| {
        let store = Arc::clone(&store);
        let admin = admin.clone();
        tokio::spawn(async move {
            loop {
                let current = store.find_task(task.id).await.unwrap().unwrap().version;
                match update_task(store.as_ref(), &admin, task.id, current, TaskPatch::default())
                    .await
                {
                    Ok(_) => break,
                    Err(UpdateError::Conflict { .. }) => tokio::task::yield_now().await,
                    Err(other) => panic!("Unexpected error: {}", other),
                }
            }
        })
    });

    for joined in join_all(handles).await {
        joined.expect("Task panicked");
    }

    let stored = store.find_task(task.id).await.unwrap().unwrap();
    assert_eq!(stored.version, 1 + writers);
}
