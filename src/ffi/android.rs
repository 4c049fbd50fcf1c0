//! Android platform bindings via JNI (Java Native Interface).
//!
//! These functions are called directly from Kotlin. They wrap the C FFI
//! layer; callbacks go back to the controller object through a global
//! reference and the JVM handle.
//!
//! # Package Name
//! The JNI functions are named for package: `com.f4hbw.pocsagsdr`
//! Class: `SDRController`
//!
//! Kotlin side:
//! ```kotlin
//! private external fun nativeProcess(data: ByteArray, length: Int): Int
//! private fun onNativeMessage(msg: String)
//! private fun onNativePage(time: String, address: String, text: String, type: String)
//! ```

use std::ffi::c_void;

use jni::objects::{GlobalRef, JByteArray, JClass, JObject, JString, JValue};
use jni::sys::{jint, jlong, jlongArray, JNI_VERSION_1_6};
use jni::{JNIEnv, JavaVM};
use tracing::{debug, warn};

use super::callbacks::PocsagCallbacks;
use super::client::{
    create_session, pocsag_destroy, pocsag_finish, pocsag_get_stats,
    pocsag_process, pocsag_reset, pocsag_version,
};
use super::types::*;
use crate::bridge::LegacyBridge;
use crate::config::DecoderConfig;
use crate::device;
use crate::error::{Error, Result};
use crate::pocsag::PocsagMessage;
use crate::session::SessionSink;

const STATUS_METHOD: &str = "onNativeMessage";
const STATUS_SIG: &str = "(Ljava/lang/String;)V";
const PAGE_METHOD: &str = "onNativePage";
const PAGE_SIG: &str = "(Ljava/lang/String;Ljava/lang/String;Ljava/lang/String;Ljava/lang/String;)V";

/// Session sink calling back into a Kotlin controller.
struct JniSink {
    jvm: JavaVM,
    controller: GlobalRef,
}

impl JniSink {
    fn bind(env: &JNIEnv, controller: &JObject) -> Result<Self> {
        let jvm = env.get_java_vm().map_err(jni_error)?;
        let controller = env.new_global_ref(controller).map_err(jni_error)?;
        Ok(Self { jvm, controller })
    }

    /// Call a `void` method taking strings; returns false if the call failed.
    fn call(&self, method: &str, sig: &str, args: &[&str]) -> bool {
        let Ok(mut env) = self.jvm.attach_current_thread() else {
            warn!("Cannot attach thread to the JVM");
            return false;
        };

        let mut strings = Vec::with_capacity(args.len());
        for arg in args {
            match env.new_string(arg) {
                Ok(s) => strings.push(s),
                Err(e) => {
                    warn!("Cannot create Java string: {}", e);
                    return false;
                }
            }
        }
        let values: Vec<JValue> = strings.iter().map(|s| JValue::Object(s)).collect();

        match env.call_method(&self.controller, method, sig, &values) {
            Ok(_) => true,
            Err(e) => {
                // Leave no pending exception behind for the caller thread
                if env.exception_check().unwrap_or(false) {
                    let _ = env.exception_clear();
                }
                debug!("{} failed: {}", method, e);
                false
            }
        }
    }
}

impl SessionSink for JniSink {
    fn on_status(&self, status: &str) {
        if !self.call(STATUS_METHOD, STATUS_SIG, &[status]) {
            warn!("Status dropped: {}", status);
        }
    }

    fn on_message(&self, message: &PocsagMessage) {
        let time = message.time_label();
        let address = message.address_label();
        let args = [
            time.as_str(),
            address.as_str(),
            message.content.as_str(),
            message.kind.label(),
        ];
        if !self.call(PAGE_METHOD, PAGE_SIG, &args) {
            // Older controllers only know onNativeMessage
            let line = message.to_string();
            if !self.call(STATUS_METHOD, STATUS_SIG, &[&line]) {
                warn!("Page dropped: {}", line);
            }
        }
    }
}

fn jni_error(e: jni::errors::Error) -> Error {
    Error::internal(format!("JNI: {e}"))
}

fn error_code(e: &Error) -> jint {
    PocsagResult::from(e) as jint
}

/// Get a String from a JString, returning None if null or invalid
fn get_string(env: &mut JNIEnv, s: &JString) -> Option<String> {
    if s.is_null() {
        return None;
    }
    env.get_string(s).ok().map(|s| s.into())
}

/// Copy a Java byte array, rejecting null.
fn read_bytes(env: &JNIEnv, data: &JByteArray) -> Result<Vec<u8>> {
    if data.is_null() {
        return Err(Error::param("data array is null"));
    }
    env.convert_byte_array(data).map_err(jni_error)
}

/// Counters behind `handle` as Java longs, `None` for a bad handle.
fn stats_values(handle: jlong) -> Option<Vec<jlong>> {
    if handle == 0 {
        return None;
    }
    let mut stats = PocsagStats::default();
    let result = unsafe { pocsag_get_stats(handle as PocsagHandle, &mut stats) };
    if result != PocsagResult::Ok {
        return None;
    }
    Some(stats.to_array().iter().map(|&v| v as jlong).collect())
}

// =============================================================================
// JNI Native Methods
// =============================================================================

#[no_mangle]
pub extern "system" fn JNI_OnLoad(_vm: JavaVM, _reserved: *mut c_void) -> jint {
    debug!("pocsagsdr native library loaded");
    JNI_VERSION_1_6
}

/// Legacy entry point: `nativeProcess(data: ByteArray, length: Int): Int`.
///
/// The first controller to call this receives every report for the rest
/// of the process.
#[no_mangle]
pub extern "system" fn Java_com_f4hbw_pocsagsdr_SDRController_nativeProcess(
    env: JNIEnv,
    obj: JObject,
    data: JByteArray,
    length: jint,
) -> jint {
    let bytes = match read_bytes(&env, &data) {
        Ok(b) => b,
        Err(e) => {
            warn!("nativeProcess: {}", e);
            return error_code(&e);
        }
    };

    let bridge = LegacyBridge::global();
    let result = bridge.process(&bytes, length, || {
        JniSink::bind(&env, &obj).map(|sink| Box::new(sink) as Box<dyn SessionSink>)
    });

    match result {
        Ok(n) => n,
        Err(e) => {
            warn!("nativeProcess: {}", e);
            error_code(&e)
        }
    }
}

/// Create a session reporting to this controller.
///
/// `config_json` may be null for defaults. Returns 0 on error.
#[no_mangle]
pub extern "system" fn Java_com_f4hbw_pocsagsdr_SDRController_nativeCreate(
    mut env: JNIEnv,
    obj: JObject,
    config_json: JString,
) -> jlong {
    let config = match get_string(&mut env, &config_json) {
        Some(json) => match DecoderConfig::from_json_str(&json) {
            Ok(c) => c,
            Err(e) => {
                warn!("nativeCreate: {}", e);
                return 0;
            }
        },
        None => DecoderConfig::default(),
    };

    let sink = match JniSink::bind(&env, &obj) {
        Ok(s) => s,
        Err(e) => {
            warn!("nativeCreate: {}", e);
            return 0;
        }
    };

    match create_session(config, Box::new(sink), PocsagCallbacks::default()) {
        Ok(handle) => handle as jlong,
        Err(e) => {
            warn!("nativeCreate: {}", e);
            0
        }
    }
}

/// Process a block on a session created by `nativeCreate`.
#[no_mangle]
pub extern "system" fn Java_com_f4hbw_pocsagsdr_SDRController_nativeProcessHandle(
    env: JNIEnv,
    _obj: JObject,
    handle: jlong,
    data: JByteArray,
    length: jint,
) -> jint {
    if handle == 0 {
        return PocsagResult::InvalidParam as jint;
    }
    let bytes = match read_bytes(&env, &data) {
        Ok(b) => b,
        Err(e) => return error_code(&e),
    };
    unsafe { pocsag_process(handle as PocsagHandle, bytes.as_ptr(), bytes.len(), length) }
}

/// Flush the pending page. Returns the number of pages delivered.
#[no_mangle]
pub extern "system" fn Java_com_f4hbw_pocsagsdr_SDRController_nativeFinish(
    _env: JNIEnv,
    _obj: JObject,
    handle: jlong,
) -> jint {
    if handle == 0 {
        return PocsagResult::InvalidParam as jint;
    }
    unsafe { pocsag_finish(handle as PocsagHandle) }
}

#[no_mangle]
pub extern "system" fn Java_com_f4hbw_pocsagsdr_SDRController_nativeReset(
    _env: JNIEnv,
    _obj: JObject,
    handle: jlong,
) -> jint {
    if handle == 0 {
        return PocsagResult::InvalidParam as jint;
    }
    unsafe { pocsag_reset(handle as PocsagHandle) as jint }
}

/// Get session statistics as long array, in `PocsagStats` field order:
/// [bytes_received, blocks, samples, bits, preambles, syncs, inverted_syncs,
///  batches, codewords_clean, codewords_corrected, codewords_uncorrectable, messages]
#[no_mangle]
pub extern "system" fn Java_com_f4hbw_pocsagsdr_SDRController_nativeGetStats<'local>(
    env: JNIEnv<'local>,
    _obj: JObject<'local>,
    handle: jlong,
) -> jlongArray {
    let Some(data) = stats_values(handle) else {
        return std::ptr::null_mut();
    };
    let arr = match env.new_long_array(data.len() as i32) {
        Ok(arr) => arr,
        Err(_) => return std::ptr::null_mut(),
    };
    match env.set_long_array_region(&arr, 0, &data) {
        Ok(()) => arr.into_raw(),
        Err(e) => {
            warn!("nativeGetStats: {}", e);
            std::ptr::null_mut()
        }
    }
}

#[no_mangle]
pub extern "system" fn Java_com_f4hbw_pocsagsdr_SDRController_nativeDestroy(
    _env: JNIEnv,
    _obj: JObject,
    handle: jlong,
) {
    if handle == 0 {
        return;
    }
    unsafe {
        pocsag_destroy(handle as PocsagHandle);
    }
}

/// Name of an SDR by USB ids, `Unknown SDR` when not listed.
#[no_mangle]
pub extern "system" fn Java_com_f4hbw_pocsagsdr_SDRController_nativeIdentifyDevice<'local>(
    env: JNIEnv<'local>,
    _class: JClass<'local>,
    vendor_id: jint,
    product_id: jint,
) -> JString<'local> {
    let name = device::describe(vendor_id as u16, product_id as u16);
    env.new_string(name).unwrap_or_default()
}

/// Get library version.
#[no_mangle]
pub extern "system" fn Java_com_f4hbw_pocsagsdr_SDRController_getVersion<'local>(
    env: JNIEnv<'local>,
    _class: JClass<'local>,
) -> JString<'local> {
    let version = unsafe {
        let ptr = pocsag_version();
        std::ffi::CStr::from_ptr(ptr).to_string_lossy().into_owned()
    };

    env.new_string(&version).unwrap_or_default()
}
