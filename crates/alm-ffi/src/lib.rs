//! C FFI bindings for alm-core
//!
//! This crate provides a C-compatible API so a host application can hand
//! feature text to the converter and read the resulting sheets back cell by
//! cell, or as a single JSON document.

use alm_core::{convert, SheetConfig, SheetTable};
use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::ptr;

/// Opaque handle to a converted workbook
pub struct AlmWorkbook {
    feature_name: String,
    sheets: Vec<SheetTable>,
}

impl AlmWorkbook {
    fn sheet(&self, index: usize) -> Option<&SheetTable> {
        self.sheets.get(index)
    }
}

fn into_c_string(s: &str) -> *mut c_char {
    CString::new(s)
        .map(CString::into_raw)
        .unwrap_or(ptr::null_mut())
}

/// Convert feature text into a workbook using the default sheet config
///
/// # Safety
/// - `content` must be a valid, NUL-terminated C string or null
/// - Returns null if `content` is null or not valid UTF-8
/// - Caller must free the result with `alm_free_workbook`
#[no_mangle]
pub unsafe extern "C" fn alm_convert(content: *const c_char) -> *mut AlmWorkbook {
    if content.is_null() {
        return ptr::null_mut();
    }

    let text = match CStr::from_ptr(content).to_str() {
        Ok(s) => s,
        Err(_) => return ptr::null_mut(),
    };

    let conversion = convert(text, &SheetConfig::default());
    Box::into_raw(Box::new(AlmWorkbook {
        feature_name: conversion.feature_name,
        sheets: conversion.sheets,
    }))
}

/// Free a workbook
///
/// # Safety
/// - `book` must be a valid pointer returned by `alm_convert` or null
#[no_mangle]
pub unsafe extern "C" fn alm_free_workbook(book: *mut AlmWorkbook) {
    if !book.is_null() {
        drop(Box::from_raw(book));
    }
}

/// Get the feature title of a workbook
///
/// # Safety
/// - `book` must be a valid pointer returned by `alm_convert`
/// - Caller must free the returned string with `alm_free_string`
#[no_mangle]
pub unsafe extern "C" fn alm_feature_name(book: *const AlmWorkbook) -> *mut c_char {
    if book.is_null() {
        return ptr::null_mut();
    }
    into_c_string(&(*book).feature_name)
}

/// Get the number of sheets in a workbook
///
/// # Safety
/// - `book` must be a valid pointer returned by `alm_convert`
#[no_mangle]
pub unsafe extern "C" fn alm_sheet_count(book: *const AlmWorkbook) -> usize {
    if book.is_null() {
        return 0;
    }
    (*book).sheets.len()
}

/// Get a sheet name by index
///
/// # Safety
/// - `book` must be a valid pointer returned by `alm_convert`
/// - Returns null if index is out of bounds
/// - Caller must free the returned string with `alm_free_string`
#[no_mangle]
pub unsafe extern "C" fn alm_sheet_name(book: *const AlmWorkbook, sheet: usize) -> *mut c_char {
    if book.is_null() {
        return ptr::null_mut();
    }

    (*book)
        .sheet(sheet)
        .map(|s| into_c_string(&s.name))
        .unwrap_or(ptr::null_mut())
}

/// Get the row count of a sheet, header row included
///
/// # Safety
/// - `book` must be a valid pointer returned by `alm_convert`
#[no_mangle]
pub unsafe extern "C" fn alm_sheet_row_count(book: *const AlmWorkbook, sheet: usize) -> usize {
    if book.is_null() {
        return 0;
    }
    (*book).sheet(sheet).map_or(0, |s| s.rows.len())
}

/// Get a cell value; row 0 is the header row
///
/// # Safety
/// - `book` must be a valid pointer returned by `alm_convert`
/// - Returns null if sheet, row or col is out of bounds
/// - Caller must free the returned string with `alm_free_string`
#[no_mangle]
pub unsafe extern "C" fn alm_sheet_cell(
    book: *const AlmWorkbook,
    sheet: usize,
    row: usize,
    col: usize,
) -> *mut c_char {
    if book.is_null() {
        return ptr::null_mut();
    }

    (*book)
        .sheet(sheet)
        .and_then(|s| s.rows.get(row))
        .and_then(|r| r.get(col))
        .map(|c| into_c_string(c))
        .unwrap_or(ptr::null_mut())
}

/// Serialize every sheet of a workbook as JSON
///
/// # Safety
/// - `book` must be a valid pointer returned by `alm_convert`
/// - Caller must free the returned string with `alm_free_string`
#[no_mangle]
pub unsafe extern "C" fn alm_workbook_json(book: *const AlmWorkbook) -> *mut c_char {
    if book.is_null() {
        return ptr::null_mut();
    }

    match serde_json::to_string(&(*book).sheets) {
        Ok(json) => into_c_string(&json),
        Err(_) => ptr::null_mut(),
    }
}

/// Free a string returned by other FFI functions
///
/// # Safety
/// - `s` must be a valid pointer returned by an alm_* function or null
#[no_mangle]
pub unsafe extern "C" fn alm_free_string(s: *mut c_char) {
    if !s.is_null() {
        drop(CString::from_raw(s));
    }
}
