#![allow(clippy::expect_used)]

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde_json::json;
use siteforge_domain::{ArtifactKind, Manifest, Navigation, NotificationLevel, WebUrl};
use tempfile::TempDir;

use super::ManifestProvisioner;
use crate::client::{AuthMode, WebInfo};
use crate::error::{ArtifactError, ProvisionError, RemoteError};
use crate::memory::MemorySite;
use crate::notify::NotificationLog;
use crate::phase::Phase;
use crate::retry::{RetryPolicy, RetryingClient};
use crate::scripts::{NAVIGATION_PAYLOAD_MARKER, embedded_payload};

fn site() -> MemorySite {
    MemorySite::new("https://contoso.example")
}

fn manifest(value: serde_json::Value) -> Manifest {
    serde_json::from_value(value).expect("manifest")
}

fn write_asset(base: &Path, relative: &str, contents: &str) {
    let path = base.join(relative);
    fs::create_dir_all(path.parent().expect("parent")).expect("mkdir");
    fs::write(path, contents).expect("write asset");
}

fn full_manifest(base: &Path) -> Manifest {
    write_asset(base, "SiteAssets/templates/project.dotx", "template");
    write_asset(base, "SiteAssets/js/app.js", "console.log('app');");
    manifest(json!({
        "manifest_name": "intranet",
        "base_file_path": base.display().to_string(),
        "features_to_add": ["publishing"],
        "groups": { "Owners": { "description": "Site owners" } },
        "role_definitions": {
            "Contribute Lite": { "base_permissions": ["ViewListItems"], "order": 10 }
        },
        "fields": {
            "ProjectCode": { "schema_xml": "<Field Type=\"Text\" Name=\"ProjectCode\"/>" }
        },
        "content_types": {
            "Project": { "id": "0x0100AB", "field_refs": ["ProjectCode"] }
        },
        "list_creators": {
            "Projects": { "url": "Lists/Projects", "content_types": ["Project"] },
            "Documents": {
                "url": "Shared Documents",
                "template_type": 101,
                "document_template": "SiteAssets/templates/project.dotx"
            }
        },
        "files": {
            "SiteAssets/templates/project.dotx": {},
            "SiteAssets/js/app.js": {}
        },
        "custom_actions": {
            "AppScript": { "location": "ScriptLink", "script_src": "~site/SiteAssets/js/app.js" }
        },
        "classic_workflows": {
            "Approval": { "list_title": "Projects", "workflow_template": "Approval" }
        },
        "remote_event_registrations": {
            "ItemAdded": {
                "list_title": "Projects",
                "event_receiver_type": "ItemAdded",
                "endpoint_url": "https://events.example/hook"
            }
        },
        "navigation": { "top_nav": [{ "title": "Projects", "url": "Lists/Projects" }] },
        "look_and_feel": { "site_logo_url": "/SiteAssets/logo.png" }
    }))
}

fn app_web(site: &mut MemorySite) -> WebUrl {
    let url = WebUrl::try_from("/app").expect("url");
    site.insert_web(WebInfo {
        server_relative_url: url.clone(),
        title: "App".to_string(),
        description: String::new(),
        language: 1033,
        web_template: "APP#0".to_string(),
        has_unique_permissions: false,
        app_instance_id: Some("7d5a9c1e".to_string()),
        properties: BTreeMap::new(),
    });
    url
}

fn normal_details(log: &NotificationLog) -> Vec<String> {
    log.snapshot()
        .into_iter()
        .filter(|notification| notification.level == NotificationLevel::Normal)
        .map(|notification| notification.detail)
        .collect()
}

#[test]
fn second_run_creates_nothing_and_reports_existing_artifacts() {
    let temp = TempDir::new().expect("tempdir");
    let manifest = full_manifest(temp.path());
    let web = WebUrl::root();
    let mut site = site();

    let first = NotificationLog::new();
    ManifestProvisioner::new(&mut site, first.notifier())
        .provision(&web, &manifest)
        .expect("first run");
    let created: Vec<String> = first
        .details()
        .into_iter()
        .filter_map(|detail| detail.strip_prefix("Created ").map(str::to_string))
        .collect();
    assert_eq!(created.len(), 13, "created: {created:?}");

    site.clear_calls();
    let second = NotificationLog::new();
    ManifestProvisioner::new(&mut site, second.notifier())
        .provision(&web, &manifest)
        .expect("second run");

    let details = second.details();
    for artifact in &created {
        let expected = format!("{artifact} already exists");
        assert!(details.contains(&expected), "missing {expected:?} in {details:?}");
    }
    assert_eq!(
        normal_details(&second),
        vec!["Successfully provisioned manifest intranet to web at /"]
    );
    assert!(site.calls_to("put_artifact").is_empty());
    assert!(site.calls_to("activate_feature").is_empty());
    assert!(site.calls_to("associate_workflow").is_empty());
    assert!(site.calls_to("set_navigation").is_empty());
}

#[test]
fn phases_run_in_dependency_order() {
    let temp = TempDir::new().expect("tempdir");
    let manifest = full_manifest(temp.path());
    let log = NotificationLog::new();
    let mut site = site();

    let outcome = ManifestProvisioner::new(&mut site, log.notifier())
        .provision(&WebUrl::root(), &manifest)
        .expect("provision");

    let field = log.position("Created field ProjectCode").expect("field");
    let content_type = log.position("Created content type Project").expect("content type");
    let list = log.position("Created list Projects").expect("list");
    let file = log
        .position("Created file SiteAssets/templates/project.dotx")
        .expect("file");
    let template = log
        .position("Set document template of list Documents")
        .expect("template");
    assert!(field < content_type);
    assert!(content_type < list);
    assert!(list < file);
    assert!(file < template);
    assert_eq!(outcome.phases_run.len(), 13);
    assert!(outcome.injected_custom_actions.is_empty());
    assert_eq!(
        log.position("Completed AddFeatures"),
        log.position("Activated feature publishing").map(|index| index + 1)
    );
}

#[test]
fn content_type_with_missing_field_fails_naming_phase_and_web() {
    let manifest = manifest(json!({
        "manifest_name": "intranet",
        "content_types": { "Project": { "id": "0x0100AB", "field_refs": ["ProjectCode"] } }
    }));
    let mut site = site();

    let error = ManifestProvisioner::new(&mut site, NotificationLog::new().notifier())
        .provision(&WebUrl::root(), &manifest)
        .expect_err("field is missing");

    assert!(
        matches!(
            &error,
            ProvisionError::Phase {
                manifest,
                web_url,
                phase: Phase::ProvisionContentTypes,
                source: ArtifactError::MissingDependency { dependency, .. },
            } if manifest == "intranet" && web_url.is_root() && dependency == "ProjectCode"
        ),
        "unexpected error: {error:?}"
    );
    assert_eq!(
        error.to_string(),
        "error provisioning manifest intranet to web at / during ProvisionContentTypes"
    );
    assert!(
        site.artifact(&WebUrl::root(), ArtifactKind::ContentType, "Project")
            .is_none()
    );
}

#[test]
fn empty_manifest_loads_context_once_and_reports_success() {
    let manifest = manifest(json!({ "manifest_name": "intranet" }));
    let log = NotificationLog::new();
    let mut site = site();

    let outcome = ManifestProvisioner::new(&mut site, log.notifier())
        .provision(&WebUrl::root(), &manifest)
        .expect("provision");

    assert!(outcome.phases_run.is_empty());
    assert_eq!(site.calls(), ["load_context /"]);
    assert_eq!(
        log.details(),
        vec!["Successfully provisioned manifest intranet to web at /"]
    );
}

#[test]
fn app_web_skips_host_only_phases_and_injects_navigation() {
    let navigation: Navigation = serde_json::from_value(json!({
        "top_nav": [{
            "title": "Home",
            "url": "default.aspx",
            "children": [{ "title": "Docs", "url": "https://docs.example", "is_external": true }]
        }],
        "clear_top_menu": true
    }))
    .expect("navigation");
    let manifest = manifest(json!({
        "manifest_name": "intranet",
        "features_to_add": ["publishing"],
        "features_to_remove": ["mds"],
        "groups": { "Owners": {} },
        "role_definitions": { "Reader Plus": { "base_permissions": ["ViewPages"] } },
        "navigation": navigation
    }));
    let log = NotificationLog::new();
    let mut site = site();
    let web = app_web(&mut site);

    let outcome = ManifestProvisioner::new(&mut site, log.notifier())
        .provision(&web, &manifest)
        .expect("provision");

    assert!(site.calls().iter().all(|call| !call.contains("feature")));
    assert!(site.calls().iter().all(|call| !call.contains("Owners")));
    assert!(site.calls().iter().all(|call| !call.contains("Reader Plus")));
    assert!(site.calls_to("set_navigation").is_empty());
    assert!(
        log.details()
            .iter()
            .all(|detail| !detail.contains("feature") && !detail.contains("group"))
    );
    assert_eq!(
        outcome.phases_run,
        vec![Phase::ProvisionNavigation, Phase::ProvisionCustomActions]
    );

    let titles: Vec<&String> = outcome.injected_custom_actions.keys().collect();
    assert_eq!(titles, ["AppNavigationCustomActionintranet"]);
    let action = &outcome.injected_custom_actions["AppNavigationCustomActionintranet"];
    let script = action.script_block.as_deref().expect("script");
    let payload = embedded_payload(script, NAVIGATION_PAYLOAD_MARKER).expect("payload");
    let decoded: Navigation = serde_json::from_str(payload).expect("decode");
    assert_eq!(decoded, navigation);
    assert!(
        site.artifact(
            &web,
            ArtifactKind::CustomAction,
            "AppNavigationCustomActionintranet"
        )
        .is_some()
    );
}

#[test]
fn changed_app_navigation_rewrites_the_injected_script() {
    let with_nav = |title: &str| {
        manifest(json!({
            "manifest_name": "intranet",
            "navigation": { "top_nav": [{ "title": title, "url": "default.aspx" }] }
        }))
    };
    let mut site = site();
    let web = app_web(&mut site);
    ManifestProvisioner::new(&mut site, NotificationLog::new().notifier())
        .provision(&web, &with_nav("Old"))
        .expect("first provision");

    let log = NotificationLog::new();
    ManifestProvisioner::new(&mut site, log.notifier())
        .provision(&web, &with_nav("New"))
        .expect("second provision");

    assert!(
        normal_details(&log)
            .iter()
            .any(|detail| detail == "Updated custom action AppNavigationCustomActionintranet")
    );
    let script = site
        .artifact(&web, ArtifactKind::CustomAction, "AppNavigationCustomActionintranet")
        .and_then(|action| action.property("script_block"))
        .expect("stored script");
    assert!(script.contains("\"New\""));
    assert!(!script.contains("\"Old\""));
}

#[test]
fn host_web_navigation_is_applied_natively() {
    let manifest = manifest(json!({
        "manifest_name": "intranet",
        "navigation": { "left_nav": [{ "title": "Projects", "url": "Lists/Projects" }] }
    }));
    let mut site = site();

    let outcome = ManifestProvisioner::new(&mut site, NotificationLog::new().notifier())
        .provision(&WebUrl::root(), &manifest)
        .expect("provision");

    assert!(outcome.injected_custom_actions.is_empty());
    let stored = site
        .web(&WebUrl::root())
        .and_then(|web| web.navigation.clone())
        .expect("navigation stored");
    assert_eq!(Some(&stored), manifest.navigation.as_ref());
}

#[test]
fn anonymous_identity_queues_one_workflow_script_instead_of_calling_the_service() {
    let manifest = manifest(json!({
        "manifest_name": "intranet",
        "list_creators": { "Projects": { "url": "Lists/Projects" } },
        "classic_workflows": {
            "Approval": { "list_title": "Projects", "workflow_template": "Approval" }
        }
    }));
    let mut site = site().with_auth_mode(AuthMode::AppOnly);

    let outcome = ManifestProvisioner::new(&mut site, NotificationLog::new().notifier())
        .provision(&WebUrl::root(), &manifest)
        .expect("provision");

    assert!(site.calls_to("associate_workflow").is_empty());
    let titles: Vec<&String> = outcome.injected_custom_actions.keys().collect();
    assert_eq!(titles, ["AppWorkflowAssociationCustomActionintranet"]);
    let action = site
        .artifact(
            &WebUrl::root(),
            ArtifactKind::CustomAction,
            "AppWorkflowAssociationCustomActionintranet",
        )
        .expect("custom action created");
    assert!(
        action
            .property("script_block")
            .is_some_and(|script| script.contains("AddWorkflowAssociation"))
    );
}

#[test]
fn anonymous_identity_skips_workflows_already_associated() {
    let manifest = manifest(json!({
        "manifest_name": "intranet",
        "list_creators": { "Projects": { "url": "Lists/Projects" } },
        "classic_workflows": {
            "Approval": { "list_title": "Projects", "workflow_template": "Approval" }
        }
    }));
    let mut interactive = site();
    ManifestProvisioner::new(&mut interactive, NotificationLog::new().notifier())
        .provision(&WebUrl::root(), &manifest)
        .expect("interactive provision");
    let mut site = MemorySite::from_state(interactive.state().clone())
        .with_auth_mode(AuthMode::AppOnly);
    let log = NotificationLog::new();

    let outcome = ManifestProvisioner::new(&mut site, log.notifier())
        .provision(&WebUrl::root(), &manifest)
        .expect("anonymous provision");

    assert!(outcome.injected_custom_actions.is_empty());
    assert_eq!(site.calls_to("query_artifacts"), ["query_artifacts / workflow association"]);
    assert!(
        log.details()
            .iter()
            .any(|detail| detail == "workflow association Projects/Approval already exists")
    );
}

#[test]
fn interactive_identity_associates_workflows_directly() {
    let manifest = manifest(json!({
        "manifest_name": "intranet",
        "list_creators": { "Projects": { "url": "Lists/Projects" } },
        "classic_workflows": {
            "Approval": { "list_title": "Projects", "workflow_template": "Approval" }
        }
    }));
    let mut site = site();

    let outcome = ManifestProvisioner::new(&mut site, NotificationLog::new().notifier())
        .provision(&WebUrl::root(), &manifest)
        .expect("provision");

    assert_eq!(site.calls_to("associate_workflow").len(), 1);
    assert!(outcome.injected_custom_actions.is_empty());
    assert!(
        site.artifact(&WebUrl::root(), ArtifactKind::Workflow, "Projects/Approval")
            .is_some()
    );
}

#[test]
fn forced_files_are_reuploaded_only_when_content_changes() {
    let temp = TempDir::new().expect("tempdir");
    write_asset(temp.path(), "SiteAssets/app.js", "one");
    let manifest = manifest(json!({
        "manifest_name": "intranet",
        "base_file_path": temp.path().display().to_string(),
        "files": { "SiteAssets/app.js": { "force_overwrite": true } }
    }));
    let mut site = site();
    ManifestProvisioner::new(&mut site, NotificationLog::new().notifier())
        .provision(&WebUrl::root(), &manifest)
        .expect("first run");

    let unchanged = NotificationLog::new();
    ManifestProvisioner::new(&mut site, unchanged.notifier())
        .provision(&WebUrl::root(), &manifest)
        .expect("unchanged run");
    assert!(unchanged.position("file SiteAssets/app.js already exists").is_some());

    write_asset(temp.path(), "SiteAssets/app.js", "two");
    let changed = NotificationLog::new();
    ManifestProvisioner::new(&mut site, changed.notifier())
        .provision(&WebUrl::root(), &manifest)
        .expect("changed run");
    assert!(changed.position("Updated file SiteAssets/app.js").is_some());
}

#[test]
fn lists_are_updated_only_when_flagged_and_changed() {
    let with_description = |description: &str, update_existing: bool| {
        manifest(json!({
            "manifest_name": "intranet",
            "list_creators": {
                "Projects": {
                    "url": "Lists/Projects",
                    "description": description,
                    "update_existing": update_existing
                }
            }
        }))
    };
    let web = WebUrl::root();
    let mut site = site();
    ManifestProvisioner::new(&mut site, NotificationLog::new().notifier())
        .provision(&web, &with_description("Old", true))
        .expect("first run");

    let ignored = NotificationLog::new();
    ManifestProvisioner::new(&mut site, ignored.notifier())
        .provision(&web, &with_description("New", false))
        .expect("unflagged run");
    assert!(ignored.position("list Projects already exists").is_some());

    let updated = NotificationLog::new();
    ManifestProvisioner::new(&mut site, updated.notifier())
        .provision(&web, &with_description("New", true))
        .expect("flagged run");
    assert!(updated.position("Updated list Projects").is_some());
    let record = site
        .artifact(&web, ArtifactKind::List, "Projects")
        .expect("list record");
    assert_eq!(record.property("description"), Some("New"));
}

#[test]
fn deprovision_removes_referencing_artifacts_first_and_keeps_site_level_settings() {
    let temp = TempDir::new().expect("tempdir");
    let manifest = full_manifest(temp.path());
    let web = WebUrl::root();
    let mut site = site();
    ManifestProvisioner::new(&mut site, NotificationLog::new().notifier())
        .provision(&web, &manifest)
        .expect("provision");

    let log = NotificationLog::new();
    let phases = ManifestProvisioner::new(&mut site, log.notifier())
        .deprovision(&web, &manifest)
        .expect("deprovision");

    let order = [
        "Deleted custom action AppScript",
        "Deleted file SiteAssets/templates/project.dotx",
        "Deleted folder SiteAssets/templates",
        "Deleted remote event registration Projects/ItemAdded",
        "Deleted list Projects",
        "Deleted content type Project",
        "Deleted field ProjectCode",
    ];
    let positions: Vec<usize> = order
        .iter()
        .map(|needle| log.position(needle).expect(needle))
        .collect();
    assert!(positions.windows(2).all(|pair| pair[0] < pair[1]));
    assert_eq!(phases.len(), 6);

    let remaining = site.web(&web).expect("web");
    assert!(remaining.features.contains("publishing"));
    assert!(remaining.navigation.is_some());
    assert!(site.artifact(&web, ArtifactKind::Group, "Owners").is_some());
    assert!(site.artifact(&web, ArtifactKind::List, "Projects").is_none());
}

#[test]
fn deprovision_of_absent_artifacts_succeeds() {
    let manifest = manifest(json!({
        "manifest_name": "intranet",
        "fields": { "ProjectCode": { "schema_xml": "<Field/>" } }
    }));
    let log = NotificationLog::new();
    let mut site = site();

    ManifestProvisioner::new(&mut site, log.notifier())
        .deprovision(&WebUrl::root(), &manifest)
        .expect("deprovision");

    assert!(log.position("field ProjectCode does not exist").is_some());
}

#[test]
fn settings_are_written_only_on_request() {
    let manifest = manifest(json!({
        "manifest_name": "intranet",
        "settings": { "theme": "dark" }
    }));
    let mut site = site();
    ManifestProvisioner::new(&mut site, NotificationLog::new().notifier())
        .provision(&WebUrl::root(), &manifest)
        .expect("provision");
    assert!(site.calls_to("set_web_property").is_empty());

    let log = NotificationLog::new();
    let mut provisioner = ManifestProvisioner::new(&mut site, log.notifier());
    provisioner
        .apply_settings(&WebUrl::root(), &manifest)
        .expect("apply settings");
    provisioner
        .apply_settings(&WebUrl::root(), &manifest)
        .expect("apply settings again");

    assert!(log.position("Set web property theme").is_some());
    assert!(log.position("Web property theme is already set").is_some());
    let properties = &site.web(&WebUrl::root()).expect("web").info.properties;
    assert_eq!(properties.get("theme").map(String::as_str), Some("dark"));
}

#[test]
fn transient_failures_are_absorbed_by_the_retrying_client() {
    let manifest = manifest(json!({
        "manifest_name": "intranet",
        "fields": { "ProjectCode": { "schema_xml": "<Field/>" } }
    }));
    let mut site = site();
    site.fail_next(RemoteError::Transient {
        message: "throttled".to_string(),
    });
    let mut client = RetryingClient::new(site, RetryPolicy::immediate(3));

    ManifestProvisioner::new(&mut client, NotificationLog::new().notifier())
        .provision(&WebUrl::root(), &manifest)
        .expect("provision after retry");

    assert!(
        client
            .inner()
            .artifact(&WebUrl::root(), ArtifactKind::Field, "ProjectCode")
            .is_some()
    );
}
