use bytes::Bytes;

use whisper_relay::application::services::AudioResource;

fn dir_entries(dir: &tempfile::TempDir) -> usize {
    std::fs::read_dir(dir.path()).unwrap().count()
}

#[tokio::test]
async fn given_bytes_when_materializing_then_file_holds_exact_content() {
    let dir = tempfile::TempDir::new().unwrap();

    let resource = AudioResource::materialize(dir.path(), "clip.mp3", Bytes::from("abc"))
        .await
        .unwrap();

    assert_eq!(std::fs::read(resource.path()).unwrap(), b"abc");
    assert_eq!(
        resource.path().extension().and_then(|e| e.to_str()),
        Some("mp3")
    );
}

#[tokio::test]
async fn given_missing_scratch_dir_when_materializing_then_creates_it() {
    let dir = tempfile::TempDir::new().unwrap();
    let nested = dir.path().join("scratch").join("audio");

    let resource = AudioResource::materialize(&nested, "clip.wav", Bytes::from("x"))
        .await
        .unwrap();

    assert!(resource.path().starts_with(&nested));
}

#[tokio::test]
async fn given_same_file_name_when_materializing_twice_then_paths_differ() {
    let dir = tempfile::TempDir::new().unwrap();

    let first = AudioResource::materialize(dir.path(), "clip.wav", Bytes::from("1"))
        .await
        .unwrap();
    let second = AudioResource::materialize(dir.path(), "clip.wav", Bytes::from("2"))
        .await
        .unwrap();

    assert_ne!(first.path(), second.path());
    assert_eq!(std::fs::read(second.path()).unwrap(), b"2");
}

#[tokio::test]
async fn given_scoped_block_when_it_completes_then_file_is_removed() {
    let dir = tempfile::TempDir::new().unwrap();
    let resource = AudioResource::materialize(dir.path(), "clip.wav", Bytes::from("x"))
        .await
        .unwrap();

    let existed = resource
        .scoped(|path| async move { path.exists() })
        .await;

    assert!(existed);
    assert_eq!(dir_entries(&dir), 0);
}

#[tokio::test]
async fn given_scoped_block_when_it_fails_then_file_is_removed() {
    let dir = tempfile::TempDir::new().unwrap();
    let resource = AudioResource::materialize(dir.path(), "clip.wav", Bytes::from("x"))
        .await
        .unwrap();

    let result: Result<(), String> = resource
        .scoped(|_| async { Err("engine exploded".to_string()) })
        .await;

    assert!(result.is_err());
    assert_eq!(dir_entries(&dir), 0);
}

#[tokio::test]
async fn given_resource_when_dropped_unused_then_file_is_removed() {
    let dir = tempfile::TempDir::new().unwrap();
    let resource = AudioResource::materialize(dir.path(), "clip.wav", Bytes::from("x"))
        .await
        .unwrap();
    let path = resource.path().to_path_buf();

    drop(resource);

    assert!(!path.exists());
}

#[tokio::test]
async fn given_scoped_block_when_it_panics_then_file_is_removed() {
    let dir = tempfile::TempDir::new().unwrap();
    let resource = AudioResource::materialize(dir.path(), "clip.wav", Bytes::from("x"))
        .await
        .unwrap();

    let outcome = tokio::spawn(async move {
        resource
            .scoped(|_| async { panic!("decoder crashed") })
            .await
    })
    .await;

    assert!(outcome.unwrap_err().is_panic());
    assert_eq!(dir_entries(&dir), 0);
}

#[tokio::test]
async fn given_scoped_block_when_cancelled_then_file_is_removed() {
    let dir = tempfile::TempDir::new().unwrap();
    let resource = AudioResource::materialize(dir.path(), "clip.wav", Bytes::from("x"))
        .await
        .unwrap();

    let task = tokio::spawn(async move {
        resource
            .scoped(|_| std::future::pending::<()>())
            .await
    });
    tokio::task::yield_now().await;
    task.abort();

    assert!(task.await.unwrap_err().is_cancelled());
    assert_eq!(dir_entries(&dir), 0);
}
