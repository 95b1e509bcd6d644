use std::sync::atomic::{AtomicUsize, Ordering};

use hikelog::{
    core::store::HikeStore,
    form::HikeForm,
    location::{LocationError, LocationProvider, PermissionStatus, get_current_fix},
    runtime::handle::{RuntimeConfig, RuntimeError, spawn_hikelog},
    types::{Coords, Difficulty},
    validate::ValidationError,
};

struct FakeGps {
    permission: PermissionStatus,
    position: Result<Coords, LocationError>,
    fetches: AtomicUsize,
}

impl FakeGps {
    fn granted(coords: Coords) -> Self {
        Self {
            permission: PermissionStatus::Granted,
            position: Ok(coords),
            fetches: AtomicUsize::new(0),
        }
    }
}

impl LocationProvider for FakeGps {
    async fn request_permission(&self) -> PermissionStatus {
        tokio::task::yield_now().await;
        self.permission
    }

    async fn current_position(&self) -> Result<Coords, LocationError> {
        tokio::task::yield_now().await;
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.position.clone()
    }
}

fn fill(form: &mut HikeForm, name: &str) {
    form.draft.name = name.to_string();
    form.draft.location = "Purisima Creek".to_string();
    form.draft.date = "2024-07-04 06:45".to_string();
    form.draft.length_km = "8".to_string();
}

#[tokio::test]
async fn denied_permission_skips_position_fetch() {
    let gps = FakeGps {
        permission: PermissionStatus::Denied,
        ..FakeGps::granted(Coords::new(1.0, 2.0))
    };
    assert_eq!(get_current_fix(&gps).await, Err(LocationError::PermissionDenied));
    assert_eq!(gps.fetches.load(Ordering::SeqCst), 0);

    let mut form = HikeForm::new();
    assert!(form.capture_fix(&gps).await.is_err());
    assert_eq!(
        form.location_error(),
        Some("Permission to access location was denied.")
    );
    assert_eq!(form.fix(), None);
}

#[tokio::test]
async fn unavailable_fix_keeps_a_display_message() {
    let gps = FakeGps {
        position: Err(LocationError::Unavailable("timeout".to_string())),
        ..FakeGps::granted(Coords::new(0.0, 0.0))
    };
    let mut form = HikeForm::new();
    assert!(form.capture_fix(&gps).await.is_err());
    assert_eq!(form.location_error(), Some("Error fetching location: timeout"));
}

#[tokio::test]
async fn captured_fix_fills_location_text() {
    let gps = FakeGps::granted(Coords::new(12.34567, -98.76543));
    let mut form = HikeForm::new();
    let coords = form.capture_fix(&gps).await.expect("fix");

    assert_eq!(coords, Coords::new(12.34567, -98.76543));
    assert_eq!(form.fix(), Some(coords));
    assert_eq!(form.draft.location, "Lat: 12.34567, Lng: -98.76543");
    assert_eq!(form.location_error(), None);
    assert_eq!(gps.fetches.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn create_resets_form_and_edit_keeps_it() {
    let handle = spawn_hikelog(HikeStore::new(), None, RuntimeConfig::default());
    let mut form = HikeForm::new();

    form.draft.name = "   ".to_string();
    assert_eq!(form.validate(), Err(ValidationError::MissingName));
    let err = form.save(&handle).await.unwrap_err();
    assert!(matches!(err, RuntimeError::Validation(ValidationError::MissingName)));

    fill(&mut form, "Purisima");
    form.set_difficulty(Difficulty::Hard);
    form.capture_fix(&FakeGps::granted(Coords::new(37.4, -122.3)))
        .await
        .expect("fix");
    let id = form.save(&handle).await.expect("create");
    assert_eq!(form, HikeForm::new());

    let rec = handle.get(id.clone()).await.expect("get").expect("record");
    assert_eq!(rec.difficulty_level(), Some(Difficulty::Hard));
    assert_eq!(rec.coords(), Some(Coords::new(37.4, -122.3)));

    form.edit(&rec);
    assert_eq!(form.editing(), Some(&id));
    assert_eq!(form.draft.length_km, "8");
    form.draft.name = "Purisima loop".to_string();
    let same = form.save(&handle).await.expect("edit");
    assert_eq!(same, id);
    assert_eq!(form.editing(), Some(&id));

    let list = handle.list().await.expect("list");
    assert_eq!(list.len(), 1);
    assert_eq!(list[0].name, "Purisima loop");
    assert_eq!(list[0].coords(), Some(Coords::new(37.4, -122.3)));

    handle.shutdown().await.expect("shutdown");
}

#[tokio::test]
async fn reset_all_clears_form_and_collection() {
    let handle = spawn_hikelog(HikeStore::new(), None, RuntimeConfig::default());
    let mut form = HikeForm::new();

    fill(&mut form, "A");
    let id = form.save(&handle).await.expect("create");
    let rec = handle.get(id).await.expect("get").expect("record");
    form.edit(&rec);

    form.reset_all(&handle).await.expect("reset");
    assert_eq!(form, HikeForm::new());
    assert!(handle.list().await.expect("list").is_empty());

    form.reset_all(&handle).await.expect("reset again");
    assert_eq!(form, HikeForm::new());
    handle.shutdown().await.expect("shutdown");
}

#[tokio::test]
async fn deleting_the_edited_hike_returns_to_create_mode() {
    let handle = spawn_hikelog(HikeStore::new(), None, RuntimeConfig::default());
    let mut form = HikeForm::new();

    fill(&mut form, "A");
    let id = form.save(&handle).await.expect("create");
    let rec = handle.get(id.clone()).await.expect("get").expect("record");
    form.edit(&rec);

    assert!(form.delete(&handle, id.clone()).await.expect("delete"));
    assert_eq!(form.editing(), None);
    assert!(!form.delete(&handle, id).await.expect("delete again"));
    handle.shutdown().await.expect("shutdown");
}

#[tokio::test]
async fn failed_delete_keeps_the_edit_in_progress() {
    let handle = spawn_hikelog(HikeStore::new(), None, RuntimeConfig::default());
    let mut form = HikeForm::new();

    fill(&mut form, "A");
    let id = form.save(&handle).await.expect("create");
    let rec = handle.get(id.clone()).await.expect("get").expect("record");
    form.edit(&rec);
    form.draft.name = "A, unsaved".to_string();
    handle.shutdown().await.expect("shutdown");

    let err = form.delete(&handle, id.clone()).await.unwrap_err();
    assert!(matches!(err, RuntimeError::ChannelClosed));
    assert_eq!(form.editing(), Some(&id));
    assert_eq!(form.draft.name, "A, unsaved");
}

#[tokio::test]
async fn deleting_another_hike_keeps_the_edit_in_progress() {
    let handle = spawn_hikelog(HikeStore::new(), None, RuntimeConfig::default());
    let mut form = HikeForm::new();

    fill(&mut form, "A");
    let a = form.save(&handle).await.expect("create a");
    fill(&mut form, "B");
    let b = form.save(&handle).await.expect("create b");
    let rec = handle.get(a.clone()).await.expect("get").expect("record");
    form.edit(&rec);

    assert!(form.delete(&handle, b).await.expect("delete b"));
    assert_eq!(form.editing(), Some(&a));
    assert_eq!(form.draft.name, "A");
    handle.shutdown().await.expect("shutdown");
}

#[tokio::test]
async fn reset_draft_leaves_saved_hikes_alone() {
    let handle = spawn_hikelog(HikeStore::new(), None, RuntimeConfig::default());
    let mut form = HikeForm::new();

    fill(&mut form, "A");
    form.capture_fix(&FakeGps::granted(Coords::new(1.0, 2.0)))
        .await
        .expect("fix");
    let id = form.save(&handle).await.expect("create");
    let rec = handle.get(id.clone()).await.expect("get").expect("record");
    form.edit(&rec);
    form.draft.name = "discarded".to_string();

    form.reset_draft();
    assert_eq!(form, HikeForm::new());

    let list = handle.list().await.expect("list");
    assert_eq!(list.len(), 1);
    assert_eq!(list[0].id, id);
    assert_eq!(list[0].name, "A");
    assert_eq!(list[0].coords(), Some(Coords::new(1.0, 2.0)));
    handle.shutdown().await.expect("shutdown");
}
