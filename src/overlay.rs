use crate::constants::{CAPTION_ID, OVERLAY_ID, STATUS_ID};
use web_sys as web;

#[inline]
pub fn show(document: &web::Document) {
    if let Some(el) = document.get_element_by_id(OVERLAY_ID) {
        _ = el.class_list().remove_1("hidden");
        // fallback for environments without CSS class
        _ = el.set_attribute("style", "");
    }
}

#[inline]
pub fn hide(document: &web::Document) {
    if let Some(el) = document.get_element_by_id(OVERLAY_ID) {
        _ = el.class_list().add_1("hidden");
        _ = el.set_attribute("style", "display:none");
    }
}

#[inline]
pub fn is_hidden(document: &web::Document) -> bool {
    if let Some(el) = document.get_element_by_id(OVERLAY_ID) {
        if el.class_list().contains("hidden") {
            return true;
        }
        return el
            .get_attribute("style")
            .map(|s| s.contains("display:none"))
            .unwrap_or(false);
    }
    false
}

#[inline]
pub fn toggle(document: &web::Document) {
    if is_hidden(document) {
        show(document);
    } else {
        hide(document);
    }
}

pub fn set_status(document: &web::Document, text: &str) {
    if let Some(el) = document.get_element_by_id(STATUS_ID) {
        el.set_text_content(Some(text));
    }
}

/// Fatal setup or frame error: surface it in the overlay.
pub fn show_error(document: &web::Document, message: &str) {
    set_status(document, &format!("Error: {message}"));
    show(document);
}

/// Replace the caption text; `None` clears it.
pub fn set_caption(document: &web::Document, text: Option<&str>) {
    if let Some(el) = document.get_element_by_id(CAPTION_ID) {
        el.set_text_content(text);
    }
}

pub fn set_caption_offset(document: &web::Document, offset_px: f32) {
    if let Some(el) = document.get_element_by_id(CAPTION_ID) {
        _ = el.set_attribute("style", &format!("transform: translateY({offset_px:.1}px)"));
    }
}
