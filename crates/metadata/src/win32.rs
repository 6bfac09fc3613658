//! crates/metadata/src/win32.rs
//! Account lookup through the Win32 security API.
#![allow(unsafe_code)]

use windows::Win32::Foundation::{ERROR_INSUFFICIENT_BUFFER, ERROR_NONE_MAPPED};
use windows::Win32::Security::{
    CreateWellKnownSid, LookupAccountNameW, PSID, SID_NAME_USE, SidTypeAlias, SidTypeDomain,
    SidTypeGroup, SidTypeUser, SidTypeWellKnownGroup, WELL_KNOWN_SID_TYPE, WinAnonymousSid,
    WinNullSid, WinWorldSid,
};
use windows::core::{HSTRING, PCWSTR, PWSTR};

use super::lookup::{AccountInfo, AccountKind, AccountLookup, LookupFailure};
use super::sid::WellKnownSid;

/// [`AccountLookup`] backed by `LookupAccountNameW` and `CreateWellKnownSid`.
///
/// The referenced domain name is returned as UTF-16LE bytes.
#[derive(Clone, Copy, Debug, Default)]
pub struct WindowsAccountLookup;

impl WindowsAccountLookup {
    /// Creates the lookup.
    pub const fn new() -> Self {
        Self
    }
}

fn win32_code(err: &windows::core::Error) -> u32 {
    let code = err.code().0 as u32;
    if code & 0xFFFF_0000 == 0x8007_0000 {
        code & 0xFFFF
    } else {
        code
    }
}

fn classify(code: u32, sid_len: u32, domain_len: usize) -> LookupFailure {
    if code == ERROR_INSUFFICIENT_BUFFER.0 {
        LookupFailure::InsufficientBuffer {
            sid_len: sid_len as usize,
            domain_len,
        }
    } else if code == ERROR_NONE_MAPPED.0 {
        LookupFailure::NoneMapped
    } else {
        LookupFailure::Os(code)
    }
}

fn account_kind(kind: SID_NAME_USE) -> AccountKind {
    match kind {
        SidTypeUser => AccountKind::User,
        SidTypeGroup => AccountKind::Group,
        SidTypeDomain => AccountKind::Domain,
        SidTypeAlias => AccountKind::Alias,
        SidTypeWellKnownGroup => AccountKind::WellKnownGroup,
        other => AccountKind::Other(other.0 as u32),
    }
}

const fn well_known_type(kind: WellKnownSid) -> WELL_KNOWN_SID_TYPE {
    match kind {
        WellKnownSid::Null => WinNullSid,
        WellKnownSid::World => WinWorldSid,
        WellKnownSid::Anonymous => WinAnonymousSid,
    }
}

fn sid_ptr(sid: &mut [u8]) -> Option<PSID> {
    (!sid.is_empty()).then(|| PSID(sid.as_mut_ptr().cast()))
}

impl AccountLookup for WindowsAccountLookup {
    fn lookup_account(
        &self,
        account: &str,
        sid: &mut [u8],
        domain: &mut [u8],
    ) -> Result<AccountInfo, LookupFailure> {
        let name = HSTRING::from(account);
        let mut wide_domain = vec![0u16; domain.len() / 2];
        let mut sid_len = sid.len() as u32;
        let mut domain_chars = wide_domain.len() as u32;
        let mut kind = SID_NAME_USE::default();

        // SAFETY: every pointer refers to a live buffer whose length is passed
        // alongside it, and the API writes no more than those lengths.
        let result = unsafe {
            LookupAccountNameW(
                PCWSTR::null(),
                &name,
                sid_ptr(sid),
                &mut sid_len,
                (!wide_domain.is_empty()).then(|| PWSTR(wide_domain.as_mut_ptr())),
                &mut domain_chars,
                &mut kind,
            )
        };
        if let Err(err) = result {
            return Err(classify(
                win32_code(&err),
                sid_len,
                domain_chars as usize * 2,
            ));
        }

        let written = (domain_chars as usize).min(wide_domain.len());
        for (out, ch) in domain.chunks_exact_mut(2).zip(&wide_domain[..written]) {
            out.copy_from_slice(&ch.to_le_bytes());
        }
        Ok(AccountInfo {
            sid_len: sid_len as usize,
            domain_len: written * 2,
            kind: account_kind(kind),
        })
    }

    fn create_well_known(&self, kind: WellKnownSid, sid: &mut [u8]) -> Result<usize, LookupFailure> {
        let mut sid_len = sid.len() as u32;
        // SAFETY: `sid` is valid for `sid_len` bytes.
        let result = unsafe {
            CreateWellKnownSid(well_known_type(kind), None, sid_ptr(sid), &mut sid_len)
        };
        match result {
            Ok(()) => Ok(sid_len as usize),
            Err(err) => Err(classify(win32_code(&err), sid_len, 0)),
        }
    }
}
