/// Label catalogue for pickers
///
/// ```text
/// GET /v1/labels
/// ```
///
/// ```json
/// [{ "value": "work", "name": "Work" }, ...]
/// ```

use axum::Json;
use serde::{Deserialize, Serialize};
use tasknest_shared::models::task::TaskLabel;

#[derive(Debug, Serialize, Deserialize)]
pub struct LabelInfo {
    pub value: TaskLabel,
    pub name: String,
}

pub async fn list_labels() -> Json<Vec<LabelInfo>> {
    Json(
        TaskLabel::ALL
            .into_iter()
            .map(|label| LabelInfo {
                value: label,
                name: label.display_name().to_string(),
            })
            .collect(),
    )
}
