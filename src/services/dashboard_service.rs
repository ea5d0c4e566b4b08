use std::collections::{BTreeMap, HashMap};

use reqwest::Url;
use serde::Deserialize;
use tracing::{info, warn};

use crate::models::{NewParticipation, ParticipationRecord};
use crate::services::chart_service::DonutChart;
use crate::services::participation_api::{ParticipationApiError, ParticipationClient};
use crate::services::text::{capitalize_first_letter, format_label, format_percentage};

pub const FIRST_NAME_FIELD: &str = "firstName";
pub const LAST_NAME_FIELD: &str = "lastName";
pub const PERCENTAGE_FIELD: &str = "percentage";

const FIRST_NAME_REQUIRED: &str = "First name is required.";
const LAST_NAME_REQUIRED: &str = "Last name is required.";
const PERCENTAGE_REQUIRED: &str = "Participation is required.";
const PERCENTAGE_NOT_A_NUMBER: &str = "Participation must be a number.";

/// Name of a row input, e.g. `percentage_12`.
pub fn row_field_name(field: &str, id: i64) -> String {
    format!("{}_{}", field, id)
}

/// Which row, if any, is in inline edit mode. At most one at a time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EditState {
    editing_id: Option<i64>,
}

impl EditState {
    pub fn editing(id: i64) -> Self {
        Self {
            editing_id: Some(id),
        }
    }

    pub fn editing_id(&self) -> Option<i64> {
        self.editing_id
    }

    pub fn is_editing(&self, id: i64) -> bool {
        self.editing_id == Some(id)
    }

    pub fn begin(&mut self, id: i64) {
        self.editing_id = Some(id);
    }

    pub fn cancel(&mut self) {
        self.editing_id = None;
    }

    /// Leaves edit mode after the server accepted the update.
    pub fn finish(&mut self) {
        self.editing_id = None;
    }

    /// Drops an editing id whose row is no longer in the list.
    pub fn resolve(self, records: &[ParticipationRecord]) -> Self {
        match self.editing_id {
            Some(id) if records.iter().any(|r| r.id == id) => self,
            _ => Self::default(),
        }
    }
}

/// Validation messages keyed by form field name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormErrors(BTreeMap<String, String>);

impl FormErrors {
    pub fn insert(&mut self, field: impl Into<String>, message: &str) {
        self.0.insert(field.into(), message.to_string());
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

fn check_fields(
    first_name: &str,
    last_name: &str,
    percentage: &str,
    names: [&str; 3],
) -> Result<NewParticipation, FormErrors> {
    let mut errors = FormErrors::default();

    let first = first_name.trim();
    let last = last_name.trim();
    if first.is_empty() {
        errors.insert(names[0], FIRST_NAME_REQUIRED);
    }
    if last.is_empty() {
        errors.insert(names[1], LAST_NAME_REQUIRED);
    }

    let raw = percentage.trim();
    let percentage = if raw.is_empty() {
        errors.insert(names[2], PERCENTAGE_REQUIRED);
        None
    } else {
        match raw.parse::<f64>() {
            Ok(v) if v.is_finite() => Some(v),
            _ => {
                errors.insert(names[2], PERCENTAGE_NOT_A_NUMBER);
                None
            }
        }
    };

    match percentage {
        Some(percentage) if errors.is_empty() => Ok(NewParticipation {
            first_name: first.to_string(),
            last_name: last.to_string(),
            percentage,
        }),
        _ => Err(errors),
    }
}

/// The create form at the top of the dashboard.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct ParticipationForm {
    #[serde(rename = "firstName", default)]
    pub first_name: String,
    #[serde(rename = "lastName", default)]
    pub last_name: String,
    #[serde(default)]
    pub percentage: String,
}

impl ParticipationForm {
    pub fn validate(&self) -> Result<NewParticipation, FormErrors> {
        check_fields(
            &self.first_name,
            &self.last_name,
            &self.percentage,
            [FIRST_NAME_FIELD, LAST_NAME_FIELD, PERCENTAGE_FIELD],
        )
    }
}

/// Current values of one row's inputs, as submitted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RowInputs {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub percentage: String,
}

impl RowInputs {
    pub fn from_record(record: &ParticipationRecord) -> Self {
        Self {
            id: record.id,
            first_name: record.first_name.clone(),
            last_name: record.last_name.clone(),
            percentage: record.percentage.to_string(),
        }
    }

    pub fn validate(&self) -> Result<NewParticipation, FormErrors> {
        let first = row_field_name(FIRST_NAME_FIELD, self.id);
        let last = row_field_name(LAST_NAME_FIELD, self.id);
        let percentage = row_field_name(PERCENTAGE_FIELD, self.id);
        check_fields(
            &self.first_name,
            &self.last_name,
            &self.percentage,
            [first.as_str(), last.as_str(), percentage.as_str()],
        )
    }
}

/// Picks the `*_{id}` inputs for one row out of a posted form. Inputs of other
/// rows are ignored.
pub fn read_row_fields(id: i64, fields: &HashMap<String, String>) -> RowInputs {
    let value = |field: &str| {
        fields
            .get(&row_field_name(field, id))
            .cloned()
            .unwrap_or_default()
    };
    RowInputs {
        id,
        first_name: value(FIRST_NAME_FIELD),
        last_name: value(LAST_NAME_FIELD),
        percentage: value(PERCENTAGE_FIELD),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice {
    Created,
    Updated,
    Deleted,
}

impl Notice {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "created" => Some(Notice::Created),
            "updated" => Some(Notice::Updated),
            "deleted" => Some(Notice::Deleted),
            _ => None,
        }
    }

    pub fn as_query(&self) -> &'static str {
        match self {
            Notice::Created => "created",
            Notice::Updated => "updated",
            Notice::Deleted => "deleted",
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            Notice::Created => "Participation created successfully!",
            Notice::Updated => "Participation updated successfully!",
            Notice::Deleted => "Participation has been deleted.",
        }
    }
}

#[derive(Debug, Deserialize, Default)]
pub struct DashboardQuery {
    pub edit: Option<i64>,
    pub confirm_delete: Option<i64>,
    pub notice: Option<String>,
    pub firstname: Option<String>,
    pub lastname: Option<String>,
}

impl DashboardQuery {
    /// Both names are needed for the filtered listing.
    pub fn name_filter(&self) -> Option<(&str, &str)> {
        let first = self.firstname.as_deref().map(str::trim).filter(|s| !s.is_empty())?;
        let last = self.lastname.as_deref().map(str::trim).filter(|s| !s.is_empty())?;
        Some((first, last))
    }
}

fn filter_pairs<'a>(first_name: &'a str, last_name: &'a str) -> Option<(&'a str, &'a str)> {
    let first = first_name.trim();
    let last = last_name.trim();
    if first.is_empty() || last.is_empty() {
        return None;
    }
    Some((first, last))
}

/// Local URL for `path` with `params` and the name filter appended, form-encoded.
fn href(path: &str, params: &[(&str, String)], filter: Option<(&str, &str)>) -> String {
    let mut url = match Url::parse("http://dashboard.local/") {
        Ok(base) => match base.join(path) {
            Ok(url) => url,
            Err(_) => return path.to_string(),
        },
        Err(_) => return path.to_string(),
    };
    {
        let mut query = url.query_pairs_mut();
        for (key, value) in params {
            query.append_pair(key, value);
        }
        if let Some((first, last)) = filter {
            query.append_pair("firstname", first);
            query.append_pair("lastname", last);
        }
    }
    match url.query() {
        Some(q) if !q.is_empty() => format!("{}?{}", url.path(), q),
        _ => url.path().to_string(),
    }
}

/// Everything the page shows besides the records themselves.
#[derive(Debug, Clone, Default)]
pub struct DashboardRender {
    pub edit: EditState,
    pub confirm_delete: Option<i64>,
    pub notice: Option<Notice>,
    pub error_message: Option<String>,
    pub create_form: ParticipationForm,
    pub create_errors: FormErrors,
    /// Submitted values for the row in edit mode; falls back to the record.
    pub row_inputs: Option<RowInputs>,
    pub row_errors: FormErrors,
    pub filter_first_name: String,
    pub filter_last_name: String,
}

impl DashboardRender {
    fn name_filter(&self) -> Option<(&str, &str)> {
        filter_pairs(&self.filter_first_name, &self.filter_last_name)
    }

    pub fn from_query(query: &DashboardQuery) -> Self {
        let mut edit = EditState::default();
        if let Some(id) = query.edit {
            edit.begin(id);
        }
        Self {
            edit,
            confirm_delete: query.confirm_delete,
            notice: query.notice.as_deref().and_then(Notice::parse),
            filter_first_name: query.firstname.clone().unwrap_or_default(),
            filter_last_name: query.lastname.clone().unwrap_or_default(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone)]
pub struct FieldView {
    pub name: String,
    pub value: String,
    pub error: String,
}

impl FieldView {
    fn new(name: String, value: &str, errors: &FormErrors) -> Self {
        let error = errors.get(&name).unwrap_or_default().to_string();
        Self {
            name,
            value: value.to_string(),
            error,
        }
    }

    pub fn has_error(&self) -> bool {
        !self.error.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct RowView {
    pub id: i64,
    pub editing: bool,
    pub first_name: String,
    pub last_name: String,
    pub percentage: String,
    pub edit_href: String,
    pub delete_href: String,
    pub save_action: String,
    pub first_name_input: FieldView,
    pub last_name_input: FieldView,
    pub percentage_input: FieldView,
}

#[derive(Debug, Clone)]
pub struct DeletePrompt {
    pub id: i64,
    pub label: String,
    pub action: String,
}

#[derive(Debug, Clone)]
pub struct DashboardView {
    pub rows: Vec<RowView>,
    pub show_placeholder: bool,
    pub chart: DonutChart,
    pub editing_id: Option<i64>,
    pub notice: String,
    pub error_message: String,
    pub delete_prompt: Option<DeletePrompt>,
    pub create_action: String,
    pub first_name_input: FieldView,
    pub last_name_input: FieldView,
    pub percentage_input: FieldView,
    pub filter_first_name: String,
    pub filter_last_name: String,
}

impl DashboardView {
    pub fn has_delete_prompt(&self) -> bool {
        self.delete_prompt.is_some()
    }

    pub fn delete_prompt_action(&self) -> &str {
        self.delete_prompt
            .as_ref()
            .map(|p| p.action.as_str())
            .unwrap_or_default()
    }

    pub fn delete_prompt_label(&self) -> &str {
        self.delete_prompt
            .as_ref()
            .map(|p| p.label.as_str())
            .unwrap_or_default()
    }

    pub fn has_notice(&self) -> bool {
        !self.notice.is_empty()
    }

    pub fn has_error(&self) -> bool {
        !self.error_message.is_empty()
    }

    pub fn is_filtered(&self) -> bool {
        !self.filter_first_name.trim().is_empty() && !self.filter_last_name.trim().is_empty()
    }
}

pub fn build_dashboard_view(records: &[ParticipationRecord], render: DashboardRender) -> DashboardView {
    let edit = render.edit.resolve(records);
    let no_errors = FormErrors::default();
    let filter = render.name_filter();

    let rows = records
        .iter()
        .map(|record| {
            let editing = edit.is_editing(record.id);
            let inputs = render
                .row_inputs
                .as_ref()
                .filter(|inputs| editing && inputs.id == record.id)
                .cloned()
                .unwrap_or_else(|| RowInputs::from_record(record));
            let errors = if editing {
                &render.row_errors
            } else {
                &no_errors
            };

            RowView {
                id: record.id,
                editing,
                first_name: capitalize_first_letter(&record.first_name),
                last_name: capitalize_first_letter(&record.last_name),
                percentage: format_percentage(record.percentage),
                edit_href: href("/dashboard", &[("edit", record.id.to_string())], filter),
                delete_href: href(
                    "/dashboard",
                    &[("confirm_delete", record.id.to_string())],
                    filter,
                ),
                save_action: href(&format!("/participation/{}", record.id), &[], filter),
                first_name_input: FieldView::new(
                    row_field_name(FIRST_NAME_FIELD, record.id),
                    &inputs.first_name,
                    errors,
                ),
                last_name_input: FieldView::new(
                    row_field_name(LAST_NAME_FIELD, record.id),
                    &inputs.last_name,
                    errors,
                ),
                percentage_input: FieldView::new(
                    row_field_name(PERCENTAGE_FIELD, record.id),
                    &inputs.percentage,
                    errors,
                ),
            }
        })
        .collect::<Vec<_>>();

    let delete_prompt = render.confirm_delete.and_then(|id| {
        records.iter().find(|r| r.id == id).map(|r| DeletePrompt {
            id,
            label: format_label(&r.first_name, &r.last_name),
            action: href(&format!("/participation/{}/delete", id), &[], filter),
        })
    });

    let create_action = href("/participation", &[], filter);
    let form = &render.create_form;
    DashboardView {
        show_placeholder: rows.is_empty(),
        rows,
        chart: DonutChart::from_records(records),
        editing_id: edit.editing_id(),
        notice: render
            .notice
            .map(|n| n.message().to_string())
            .unwrap_or_default(),
        error_message: render.error_message.unwrap_or_default(),
        delete_prompt,
        create_action,
        first_name_input: FieldView::new(
            FIRST_NAME_FIELD.to_string(),
            &form.first_name,
            &render.create_errors,
        ),
        last_name_input: FieldView::new(
            LAST_NAME_FIELD.to_string(),
            &form.last_name,
            &render.create_errors,
        ),
        percentage_input: FieldView::new(
            PERCENTAGE_FIELD.to_string(),
            &form.percentage,
            &render.create_errors,
        ),
        filter_first_name: render.filter_first_name,
        filter_last_name: render.filter_last_name,
    }
}

/// Where to send the browser after a form post. The page it lands on
/// re-fetches the list, under the same name filter.
pub fn dashboard_location(
    edit: EditState,
    notice: Option<Notice>,
    filter: Option<(&str, &str)>,
) -> String {
    let mut params = Vec::new();
    if let Some(id) = edit.editing_id() {
        params.push(("edit", id.to_string()));
    }
    if let Some(notice) = notice {
        params.push(("notice", notice.as_query().to_string()));
    }
    href("/dashboard", &params, filter)
}

pub struct DashboardPage {
    pub view: DashboardView,
    /// The list could not be fetched; the page shows no rows.
    pub list_failed: bool,
}

/// Fetches the current list and builds the page around it. When the list is
/// unavailable the page still renders, empty, with the form usable. An error
/// already set on `render` wins over the list error.
pub async fn load_dashboard(
    client: &ParticipationClient,
    query: &DashboardQuery,
    mut render: DashboardRender,
) -> DashboardPage {
    let records = match query.name_filter() {
        Some((first, last)) => client.list_by_name(first, last).await,
        None => client.list().await,
    };
    match records {
        Ok(records) => {
            info!(count = records.len(), editing = ?render.edit.editing_id(), "dashboard_loaded");
            DashboardPage {
                view: build_dashboard_view(&records, render),
                list_failed: false,
            }
        }
        Err(e) => {
            warn!(status = %e.status(), error = %e, "dashboard_list_failed");
            render_list_failure(&mut render, &e);
            DashboardPage {
                view: build_dashboard_view(&[], render),
                list_failed: true,
            }
        }
    }
}

fn render_list_failure(render: &mut DashboardRender, err: &ParticipationApiError) {
    if render.error_message.is_none() {
        render.error_message = Some(err.user_message());
    }
}
