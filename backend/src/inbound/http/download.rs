//! Attachment responses for rendered report files.

use actix_web::HttpResponse;
use actix_web::http::header::{
    CacheControl, CacheDirective, ContentDisposition, DispositionParam, DispositionType,
};

use crate::domain::ports::ExportedFile;

/// Serve `file` as a download named after its file name.
pub(crate) fn attachment(file: ExportedFile) -> HttpResponse {
    let ExportedFile {
        file_name,
        content_type,
        bytes,
    } = file;
    HttpResponse::Ok()
        .content_type(content_type)
        .insert_header(ContentDisposition {
            disposition: DispositionType::Attachment,
            parameters: vec![DispositionParam::Filename(file_name)],
        })
        .insert_header(CacheControl(vec![CacheDirective::NoStore]))
        .body(bytes)
}
