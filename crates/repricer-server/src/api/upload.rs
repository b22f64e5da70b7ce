use std::path::Path;

use axum::{
    body::Bytes,
    extract::{multipart::MultipartError, Multipart, State},
    http::{header, HeaderName, StatusCode},
    response::{IntoResponse, Response},
    Extension,
};
use repricer_engine::{EngineError, ReconcileRun, RunSettings};
use repricer_ledger::ArtifactFormat;
use uuid::Uuid;

use super::{ApiError, AppState};
use crate::middleware::RequestId;

pub(super) const REPORT_FILE_PREFIX: &str = "price_comparison_report";
/// Response header naming the report file written for this upload, or
/// `failed` when it could not be written.
pub(super) const REPORT_HEADER: &str = "x-report-file";

/// `POST /upload`: reprice the uploaded catalog and send back the updated
/// ledger. The comparison report is written to the configured report
/// directory under a per-upload name returned in `x-report-file`.
pub(super) async fn upload_catalog(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    multipart: Multipart,
) -> Result<Response, ApiError> {
    let request_id = req_id.0;
    let (filename, bytes) = read_file_field(multipart, &request_id).await?;

    if bytes.len() > state.config.max_upload_bytes {
        return Err(ApiError::new(
            request_id,
            "payload_too_large",
            format!(
                "upload exceeds the {} byte limit",
                state.config.max_upload_bytes
            ),
        ));
    }

    tracing::info!(
        request_id = %request_id,
        filename = %filename,
        bytes = bytes.len(),
        "catalog upload received"
    );

    let mut run = ReconcileRun::load(&filename, &bytes, &state.config.columns)
        .map_err(|e| engine_error(&request_id, &e))?;
    drop(bytes);

    let settings = RunSettings::from_app_config(&state.config);
    run.process(state.client.as_ref(), &settings)
        .await
        .map_err(|e| engine_error(&request_id, &e))?;

    let artifacts = run
        .render(&state.config.palette, ArtifactFormat::Xlsx)
        .map_err(|e| engine_error(&request_id, &e))?;

    // The report is a side artifact; losing it must not cost the caller the
    // updated ledger.
    let report_name = report_file_name();
    let report_path = state.config.report_dir.join(&report_name);
    let report_status = match artifacts.write_report(&report_path) {
        Ok(()) => report_name,
        Err(e) => {
            tracing::error!(request_id = %request_id, error = %e, "comparison report not written");
            "failed".to_owned()
        }
    };

    let ledger_format = artifacts.ledger_format;
    let ledger = artifacts
        .ledger
        .map_err(|e| engine_error(&request_id, &e))?;
    run.mark_delivered()
        .map_err(|e| engine_error(&request_id, &e))?;

    let summary = run.summary();
    tracing::info!(
        request_id = %request_id,
        total = summary.total,
        updated = summary.updated,
        fetch_failed = summary.fetch_failed,
        report = %report_status,
        "catalog reconciled"
    );

    let disposition = format!(
        "attachment; filename=\"{}\"",
        download_name(&filename, ledger_format)
    );
    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, ledger_format.content_type().to_owned()),
            (header::CONTENT_DISPOSITION, disposition),
            (HeaderName::from_static(REPORT_HEADER), report_status),
        ],
        ledger,
    )
        .into_response())
}

/// `price_comparison_report_<uuid>.xlsx`, unique per upload so concurrent
/// runs never overwrite each other's reports.
pub(super) fn report_file_name() -> String {
    format!("{REPORT_FILE_PREFIX}_{}.xlsx", Uuid::new_v4())
}

/// Pulls the `file` part out of the form, ignoring any other fields.
async fn read_file_field(
    mut multipart: Multipart,
    request_id: &str,
) -> Result<(String, Bytes), ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(request_id, &e))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let filename = field.file_name().unwrap_or_default().trim().to_owned();
        if filename.is_empty() {
            return Err(ApiError::new(request_id, "bad_request", "no file selected"));
        }
        let bytes = field
            .bytes()
            .await
            .map_err(|e| multipart_error(request_id, &e))?;
        return Ok((filename, bytes));
    }

    Err(ApiError::new(
        request_id,
        "bad_request",
        "no file part in the request",
    ))
}

fn multipart_error(request_id: &str, error: &MultipartError) -> ApiError {
    let code = if error.status() == StatusCode::PAYLOAD_TOO_LARGE {
        "payload_too_large"
    } else {
        "bad_request"
    };
    ApiError::new(request_id, code, error.body_text())
}

fn engine_error(request_id: &str, error: &EngineError) -> ApiError {
    if error.is_structural() {
        tracing::info!(request_id, error = %error, "rejected catalog upload");
        ApiError::new(request_id, "bad_request", error.to_string())
    } else {
        tracing::error!(request_id, error = %error, "catalog processing failed");
        ApiError::new(request_id, "internal_error", "failed to process catalog")
    }
}

/// `updated_<stem>.<ext>`, with the stem reduced to characters that are safe
/// inside a quoted header value.
pub(super) fn download_name(filename: &str, format: ArtifactFormat) -> String {
    let stem: String = Path::new(filename)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
        .chars()
        .filter(|c| *c == ' ' || (c.is_ascii_graphic() && !matches!(c, '"' | '\\')))
        .collect();
    let stem = if stem.trim().is_empty() {
        "catalog".to_owned()
    } else {
        stem
    };
    let ext = match format {
        ArtifactFormat::Csv => "csv",
        ArtifactFormat::Xlsx => "xlsx",
    };
    format!("updated_{stem}.{ext}")
}
