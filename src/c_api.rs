// Host (UI) bindings. Every call is guarded with catch_unwind and strings
// cross the boundary as JSON.
use crate::core::engine::{inject_dictionary_data, shared};
use crate::core::types::{DictionaryEntry, Direction, Formality, TranslateOptions};
use crate::error::InitError;
use std::ffi::{CStr, CString};
use std::os::raw::{c_char, c_int};
use std::panic::{catch_unwind, AssertUnwindSafe};
use tracing::{error, info};

/// Borrowed UTF-8 view of a C string; `None` for null or invalid UTF-8.
fn read_str<'a>(ptr: *const c_char) -> Option<&'a str> {
    if ptr.is_null() {
        return None;
    }
    unsafe { CStr::from_ptr(ptr) }.to_str().ok()
}

fn into_c_string(s: String) -> *mut c_char {
    CString::new(s).unwrap_or_default().into_raw()
}

fn error_json(message: &str) -> String {
    serde_json::json!({ "error": message }).to_string()
}

/// Builds the shared translator, merging the entries in `entries_json` (a
/// JSON array of dictionary entries, or null for none) over the bundled data.
///
/// Returns 0 on success, 1 if already initialized, -1 on bad input or panic.
#[no_mangle]
pub extern "C" fn hanyeong_init(entries_json: *const c_char) -> c_int {
    let entries: Vec<DictionaryEntry> = if entries_json.is_null() {
        Vec::new()
    } else {
        match read_str(entries_json).map(serde_json::from_str) {
            Some(Ok(entries)) => entries,
            Some(Err(e)) => {
                error!("rejected host dictionary data: {}", e);
                return -1;
            }
            None => return -1,
        }
    };
    let result = catch_unwind(AssertUnwindSafe(|| inject_dictionary_data(entries)));
    match result {
        Ok(Ok(report)) => {
            info!(?report, "translator initialized from host");
            0
        }
        Ok(Err(InitError::AlreadyInitialized)) => 1,
        Ok(Err(e)) => {
            error!("translator initialization failed: {}", e);
            -1
        }
        Err(_) => {
            error!("panic during translator initialization");
            -1
        }
    }
}

/// Translates `input`. `direction` is `ko-en` or `en-ko`; `formality` may be
/// null. Returns a JSON `TranslationResult` or `{"error": ...}`; release it
/// with [`hanyeong_free_string`].
#[no_mangle]
pub extern "C" fn hanyeong_translate(input: *const c_char, direction: *const c_char, formality: *const c_char) -> *mut c_char {
    let (Some(input), Some(direction)) = (read_str(input), read_str(direction)) else {
        return into_c_string(error_json("input and direction must be non-null UTF-8"));
    };
    let direction: Direction = match direction.parse() {
        Ok(d) => d,
        Err(e) => return into_c_string(error_json(&e)),
    };
    let formality = match read_str(formality).map(str::parse::<Formality>).transpose() {
        Ok(f) => f,
        Err(e) => return into_c_string(error_json(&e)),
    };
    let result = catch_unwind(AssertUnwindSafe(|| {
        let translator = shared().map_err(|e| e.to_string())?;
        let result = translator
            .translate_with_diagnostics(input, direction, TranslateOptions { formality })
            .map_err(|e| e.to_string())?;
        serde_json::to_string(&result).map_err(|e| e.to_string())
    }));
    let json = match result {
        Ok(Ok(json)) => json,
        Ok(Err(message)) => error_json(&message),
        Err(_) => {
            error!("panic in hanyeong_translate");
            error_json("internal error")
        }
    };
    into_c_string(json)
}

#[no_mangle]
pub extern "C" fn hanyeong_free_string(s: *mut c_char) {
    if !s.is_null() {
        unsafe {
            let _ = CString::from_raw(s);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn call(input: &str, direction: &str) -> serde_json::Value {
        let input = CString::new(input).unwrap();
        let direction = CString::new(direction).unwrap();
        let out = hanyeong_translate(input.as_ptr(), direction.as_ptr(), std::ptr::null());
        let json = unsafe { CStr::from_ptr(out) }.to_str().unwrap().to_string();
        hanyeong_free_string(out);
        serde_json::from_str(&json).unwrap()
    }

    #[test]
    fn translate_returns_result_json() {
        let value = call("안녕하세요", "ko-en");
        assert!(!value["output"].as_str().unwrap().is_empty());
        assert!(value["confidence"].is_number());
    }

    #[test]
    fn errors_come_back_as_json() {
        assert!(call("   ", "ko-en")["error"].is_string());
        assert!(call("hello", "sideways")["error"].is_string());
    }

    #[test]
    fn null_input_is_rejected() {
        let out = hanyeong_translate(std::ptr::null(), std::ptr::null(), std::ptr::null());
        let json = unsafe { CStr::from_ptr(out) }.to_str().unwrap().to_string();
        hanyeong_free_string(out);
        assert!(json.contains("error"));
    }
}
