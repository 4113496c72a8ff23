#![allow(clippy::expect_used)]

use std::path::PathBuf;

use siteforge_domain::{Notification, RunOperation, RunReport, WebUrl};

use super::{ColorChoice, OutputFormat, RenderOptions, render_report};

fn base_options() -> RenderOptions {
    RenderOptions {
        color: ColorChoice::Never,
        verbose: false,
        target: None,
    }
}

fn verbose_options() -> RenderOptions {
    RenderOptions {
        color: ColorChoice::Never,
        verbose: true,
        target: None,
    }
}

fn report(operation: RunOperation) -> RunReport {
    RunReport::new(
        operation,
        PathBuf::from("/srv/manifests/intranet.json"),
        Some(WebUrl::root()),
    )
}

fn provision_report() -> RunReport {
    let mut report = report(RunOperation::Provision);
    report.notifications = vec![
        Notification::normal("Created field ProjectCode"),
        Notification::verbose("field Status already exists"),
        Notification::normal("Activated feature 00bfea71-de22-43b2-a848-c05709900100"),
        Notification::verbose("Completed fields"),
        Notification::normal("Set web property Theme"),
        Notification::normal("Successfully provisioned manifest intranet to web at /"),
    ];
    report
}

fn render_text(report: &RunReport, options: &RenderOptions) -> String {
    render_report(report, OutputFormat::Text, options).expect("text rendering")
}

#[test]
fn text_lists_changes_and_hides_verbose_lines_by_default() {
    let text = render_text(&provision_report(), &base_options());

    assert!(text.starts_with("provision /\n"));
    assert!(text.contains("+ create"));
    assert!(text.contains("Created field ProjectCode"));
    assert!(text.contains("~ change"));
    assert!(text.contains("Set web property Theme"));
    assert!(text.contains("2 unchanged or informational"));
    assert!(!text.contains("field Status already exists"));
    assert!(!text.contains("source:"));
}

#[test]
fn text_shows_verbose_lines_and_source_when_verbose() {
    let text = render_text(&provision_report(), &verbose_options());

    assert!(text.contains("source: /srv/manifests/intranet.json"));
    assert!(text.contains("= unchanged"));
    assert!(text.contains("field Status already exists"));
    assert!(text.contains("Completed fields"));
    assert!(!text.contains("unchanged or informational"));
}

#[test]
fn summary_is_printed_after_the_change_lines() {
    let text = render_text(&provision_report(), &base_options());

    let created = text.find("Created field ProjectCode").expect("change line");
    let summary = text
        .find("Successfully provisioned manifest intranet to web at /")
        .expect("summary line");
    assert!(created < summary);
}

#[test]
fn tally_counts_each_class() {
    let text = render_text(&provision_report(), &base_options());

    assert!(text.contains("Run: 2 created, 1 changed, 1 unchanged"));
}

#[test]
fn deprovision_tally_counts_deletions() {
    let mut report = report(RunOperation::Deprovision);
    report.notifications = vec![
        Notification::normal("Deleted list Projects"),
        Notification::normal("Deleted web at /hr"),
        Notification::verbose("Web at /it does not exist"),
    ];

    let text = render_text(&report, &base_options());

    assert!(text.starts_with("deprovision /\n"));
    assert!(text.contains("- delete"));
    assert!(text.contains("Run: 2 deleted, 1 unchanged"));
}

#[test]
fn injected_custom_actions_are_listed() {
    let mut report = provision_report();
    report.injected_custom_actions = vec!["AppNavigationCustomActionintranet".to_string()];

    let text = render_text(&report, &base_options());

    assert!(text.contains("~ injected"));
    assert!(text.contains("AppNavigationCustomActionintranet"));
}

#[test]
fn errors_are_prefixed_and_counted() {
    let mut report = report(RunOperation::Provision);
    report.errors = vec![
        "Error provisioning to web at /".to_string(),
        "remote call failed: access denied".to_string(),
    ];

    let text = render_text(&report, &base_options());

    assert!(text.contains("error: Error provisioning to web at /"));
    assert!(text.contains("error: remote call failed: access denied"));
    assert!(text.contains("2 error"));
    assert!(!text.contains("Nothing to do."));
}

#[test]
fn empty_report_has_nothing_to_do() {
    let text = render_text(&report(RunOperation::Validate), &base_options());

    assert!(text.starts_with("validate /\n"));
    assert!(text.contains("Nothing to do."));
}

#[test]
fn explicit_target_overrides_report_target() {
    let options = RenderOptions {
        target: Some("https://contoso.example/hr".to_string()),
        ..base_options()
    };

    let text = render_text(&provision_report(), &options);

    assert!(text.starts_with("provision https://contoso.example/hr\n"));
}

#[test]
fn color_never_emits_no_escape_codes() {
    let text = render_text(&provision_report(), &verbose_options());

    assert!(!text.contains('\u{1b}'));
}

#[test]
fn color_always_emits_escape_codes() {
    let options = RenderOptions {
        color: ColorChoice::Always,
        ..base_options()
    };

    let text = render_text(&provision_report(), &options);

    assert!(text.contains('\u{1b}'));
}

#[test]
fn json_round_trips_the_report() {
    let report = provision_report();

    let json = render_report(&report, OutputFormat::Json, &base_options()).expect("json");
    let value: serde_json::Value = serde_json::from_str(&json).expect("valid json");

    assert_eq!(value["operation"], "provision");
    assert_eq!(value["target"], "/");
    assert_eq!(value["notifications"][1]["level"], "verbose");
    let parsed: RunReport = serde_json::from_str(&json).expect("report");
    assert_eq!(parsed, report);
}
