// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

// these bindings follow PerformanceAPI_capi.h as shipped with
// Superluminal Performance, API versions 2.0 and 3.0

use std::ffi::c_char;

/// Packs a major API version the way `PerformanceAPI_GetAPI` expects it.
pub const fn api_version(major: u32) -> u32 {
    major << 16
}

pub const PERFORMANCEAPI_VERSION_2: u32 = api_version(2);
pub const PERFORMANCEAPI_VERSION_3: u32 = api_version(3);

pub const GET_API_SYMBOL: &[u8] = b"PerformanceAPI_GetAPI";

/// `wchar_t` of the platform the native library was built for.
#[cfg(windows)]
#[allow(non_camel_case_types)]
pub type wide_char = u16;
#[cfg(not(windows))]
#[allow(non_camel_case_types)]
pub type wide_char = u32;

/// Returned by `EndEvent` so that callers cannot turn the call into a jump.
/// Nothing ever reads it.
#[allow(non_camel_case_types)]
#[repr(C)]
#[derive(Clone, Copy, Debug, Default)]
pub struct PerformanceAPI_SuppressTailCallOptimization {
    pub value: [i64; 3],
}

#[allow(non_camel_case_types)]
pub type PerformanceAPI_SetCurrentThreadName_Func = unsafe extern "C" fn(name: *const c_char);
#[allow(non_camel_case_types)]
pub type PerformanceAPI_SetCurrentThreadNameN_Func =
    unsafe extern "C" fn(name: *const c_char, name_length: u16);
#[allow(non_camel_case_types)]
pub type PerformanceAPI_BeginEvent_Func =
    unsafe extern "C" fn(id: *const c_char, data: *const c_char, color: u32);
#[allow(non_camel_case_types)]
pub type PerformanceAPI_BeginEventN_Func = unsafe extern "C" fn(
    id: *const c_char,
    id_length: u16,
    data: *const c_char,
    data_length: u16,
    color: u32,
);
#[allow(non_camel_case_types)]
pub type PerformanceAPI_BeginEventWide_Func =
    unsafe extern "C" fn(id: *const wide_char, data: *const wide_char, color: u32);
#[allow(non_camel_case_types)]
pub type PerformanceAPI_BeginEventWideN_Func = unsafe extern "C" fn(
    id: *const wide_char,
    id_length: u16,
    data: *const wide_char,
    data_length: u16,
    color: u32,
);
#[allow(non_camel_case_types)]
pub type PerformanceAPI_EndEvent_Func =
    unsafe extern "C" fn() -> PerformanceAPI_SuppressTailCallOptimization;
#[allow(non_camel_case_types)]
pub type PerformanceAPI_RegisterFiber_Func = unsafe extern "C" fn(fiber_id: u64);
#[allow(non_camel_case_types)]
pub type PerformanceAPI_UnregisterFiber_Func = unsafe extern "C" fn(fiber_id: u64);
#[allow(non_camel_case_types)]
pub type PerformanceAPI_BeginFiberSwitch_Func =
    unsafe extern "C" fn(current_fiber_id: u64, new_fiber_id: u64);
#[allow(non_camel_case_types)]
pub type PerformanceAPI_EndFiberSwitch_Func = unsafe extern "C" fn(fiber_id: u64);

#[allow(non_camel_case_types)]
pub type PerformanceAPI_GetAPI_Func =
    unsafe extern "C" fn(version: u32, out_functions: *mut PerformanceAPI_Functions) -> u32;

/// The function table filled in by `PerformanceAPI_GetAPI`.
///
/// Field order is the ABI. A version 2 library writes only the first seven
/// slots and leaves the fiber slots as they were (null).
#[allow(non_snake_case, non_camel_case_types)]
#[repr(C)]
#[derive(Clone, Copy, Default)]
pub struct PerformanceAPI_Functions {
    // API 2.0
    pub SetCurrentThreadName: Option<PerformanceAPI_SetCurrentThreadName_Func>,
    pub SetCurrentThreadNameN: Option<PerformanceAPI_SetCurrentThreadNameN_Func>,
    pub BeginEvent: Option<PerformanceAPI_BeginEvent_Func>,
    pub BeginEventN: Option<PerformanceAPI_BeginEventN_Func>,
    pub BeginEventWide: Option<PerformanceAPI_BeginEventWide_Func>,
    pub BeginEventWideN: Option<PerformanceAPI_BeginEventWideN_Func>,
    pub EndEvent: Option<PerformanceAPI_EndEvent_Func>,

    // API 3.0
    pub RegisterFiber: Option<PerformanceAPI_RegisterFiber_Func>,
    pub UnregisterFiber: Option<PerformanceAPI_UnregisterFiber_Func>,
    pub BeginFiberSwitch: Option<PerformanceAPI_BeginFiberSwitch_Func>,
    pub EndFiberSwitch: Option<PerformanceAPI_EndFiberSwitch_Func>,
}

impl PerformanceAPI_Functions {
    /// Drops the slots that did not exist in API version 2.0, in case an
    /// older library scribbled over them.
    pub fn truncate_to_v2(mut self) -> Self {
        self.RegisterFiber = None;
        self.UnregisterFiber = None;
        self.BeginFiberSwitch = None;
        self.EndFiberSwitch = None;
        self
    }
}
