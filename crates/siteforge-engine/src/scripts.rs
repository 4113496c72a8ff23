use serde::Serialize;
use siteforge_domain::{Navigation, WebUrl};

use crate::error::ArtifactError;

const NAVIGATION_TEMPLATE: &str = include_str!("scripts/navigation.js.tera");
const WORKFLOW_ASSOCIATION_TEMPLATE: &str = include_str!("scripts/workflow_association.js.tera");

/// Line prefix under which the navigation payload is embedded.
pub const NAVIGATION_PAYLOAD_MARKER: &str = "var siteforgeNavigation = ";
/// Line prefix under which the workflow associations are embedded.
pub const ASSOCIATIONS_PAYLOAD_MARKER: &str = "var siteforgeAssociations = ";

/// Association performed from the browser by the self-deleting script.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScriptedAssociation {
    pub name: String,
    pub list_title: String,
    pub workflow_template: String,
    pub task_list_title: Option<String>,
    pub history_list_title: Option<String>,
    pub start_on_create: bool,
    pub start_on_change: bool,
    pub allow_manual_start: bool,
}

fn to_json(what: &'static str, value: &impl Serialize) -> Result<String, ArtifactError> {
    serde_json::to_string(value).map_err(|source| ArtifactError::Encode { what, source })
}

fn render(
    name: &'static str,
    template: &str,
    values: &[(&str, String)],
) -> Result<String, ArtifactError> {
    let mut tera = tera::Tera::default();
    tera.add_raw_template(name, template)
        .map_err(|source| ArtifactError::Script { name, source })?;

    let mut context = tera::Context::new();
    for (key, value) in values {
        context.insert(*key, value);
    }
    tera.render(name, &context)
        .map_err(|source| ArtifactError::Script { name, source })
}

/// Render the script that injects `navigation` into an app web's menus.
///
/// # Errors
///
/// Returns an error when the tree cannot be encoded or the template fails to render.
pub fn render_navigation_script(
    web: &WebUrl,
    navigation: &Navigation,
) -> Result<String, ArtifactError> {
    render(
        "navigation",
        NAVIGATION_TEMPLATE,
        &[
            ("navigation", to_json("navigation", navigation)?),
            ("web_url", to_json("web url", &web.as_str())?),
        ],
    )
}

/// Render the script that associates workflows and then deletes the custom
/// action titled `action_title`.
///
/// # Errors
///
/// Returns an error when the associations cannot be encoded or the template fails to render.
pub fn render_workflow_association_script(
    web: &WebUrl,
    action_title: &str,
    associations: &[ScriptedAssociation],
) -> Result<String, ArtifactError> {
    render(
        "workflow_association",
        WORKFLOW_ASSOCIATION_TEMPLATE,
        &[
            ("associations", to_json("workflow associations", &associations)?),
            ("web_url", to_json("web url", &web.as_str())?),
            ("action_title", to_json("action title", &action_title)?),
        ],
    )
}

/// Extract the JSON embedded after `marker` in a rendered script.
#[must_use]
pub fn embedded_payload<'s>(script: &'s str, marker: &str) -> Option<&'s str> {
    script.lines().find_map(|line| {
        line.trim_start()
            .strip_prefix(marker)
            .map(|payload| payload.trim_end().trim_end_matches(';'))
    })
}
