//! crates/metadata/src/nss.rs
//! Account lookup over the Unix user and group databases.
//!
//! Names are looked up as users first and groups second, through whatever NSS
//! sources the host configures. Users map to `S-1-22-1-<uid>` and groups to
//! `S-1-22-2-<gid>`; the referenced domain is `Unix User` or `Unix Group`.

use nix::unistd::{Group, User};

use super::lookup::{AccountInfo, AccountKind, AccountLookup, LookupFailure};
use super::sid::Sid;

const USER_DOMAIN: &[u8] = b"Unix User";
const GROUP_DOMAIN: &[u8] = b"Unix Group";

/// [`AccountLookup`] backed by `getpwnam_r`/`getgrnam_r`.
#[derive(Clone, Copy, Debug, Default)]
pub struct NssAccountLookup;

impl NssAccountLookup {
    /// Creates the lookup.
    pub const fn new() -> Self {
        Self
    }

    fn find(account: &str) -> Result<Option<(Sid, &'static [u8], AccountKind)>, LookupFailure> {
        if let Some(user) = User::from_name(account).map_err(errno)? {
            return Ok(Some((
                Sid::unix_user(user.uid.as_raw() as u32),
                USER_DOMAIN,
                AccountKind::User,
            )));
        }
        if let Some(group) = Group::from_name(account).map_err(errno)? {
            return Ok(Some((
                Sid::unix_group(group.gid.as_raw() as u32),
                GROUP_DOMAIN,
                AccountKind::Group,
            )));
        }
        Ok(None)
    }
}

fn errno(err: nix::errno::Errno) -> LookupFailure {
    LookupFailure::Os(err as i32 as u32)
}

impl AccountLookup for NssAccountLookup {
    fn lookup_account(
        &self,
        account: &str,
        sid: &mut [u8],
        domain: &mut [u8],
    ) -> Result<AccountInfo, LookupFailure> {
        if account.is_empty() || account.contains('\0') {
            return Err(LookupFailure::NoneMapped);
        }
        let Some((found, domain_name, kind)) = Self::find(account)? else {
            return Err(LookupFailure::NoneMapped);
        };

        let sid_len = found.encoded_len();
        let domain_len = domain_name.len();
        if sid.len() < sid_len || domain.len() < domain_len {
            return Err(LookupFailure::InsufficientBuffer {
                sid_len,
                domain_len,
            });
        }

        found.write_to(sid);
        domain[..domain_len].copy_from_slice(domain_name);
        Ok(AccountInfo {
            sid_len,
            domain_len,
            kind,
        })
    }
}
