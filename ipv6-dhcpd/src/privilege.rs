//! Privilege drop: the master opens every listening socket -- some on
//! port 547 require `CAP_NET_BIND_SERVICE` --
//! then drops to a configured uid/gid *before* forking workers, so no
//! worker ever holds elevated privileges.
//!
//! Order matters: group must be dropped before user, since changing the
//! uid away from root usually forfeits the ability to change the gid
//! afterward.

use nix::unistd::{Gid, Group, Uid, User};
use tracing::warn;

use crate::error::PrivilegeError;

/// Resolves `user`/`group` and calls `setgid`/`setuid`. If privilege drop
/// fails because the process wasn't started with the necessary rights,
/// the master continues with a warning (useful for testing against
/// virtual interfaces). A *configured* user or group that doesn't resolve
/// at all is still a hard error -- that's an operator mistake, not an
/// environment limitation.
pub fn drop_privileges(user: Option<&str>, group: Option<&str>) -> Result<(), PrivilegeError> {
    let gid = group
        .map(|name| {
            Group::from_name(name)
                .map_err(PrivilegeError::from)?
                .map(|g| g.gid)
                .ok_or_else(|| PrivilegeError::UnknownGroup(name.to_string()))
        })
        .transpose()?;
    let uid = user
        .map(|name| {
            User::from_name(name)
                .map_err(PrivilegeError::from)?
                .map(|u| u.uid)
                .ok_or_else(|| PrivilegeError::UnknownUser(name.to_string()))
        })
        .transpose()?;

    if let Some(gid) = gid {
        try_setgroups(gid);
        try_setgid(gid);
    }
    if let Some(uid) = uid {
        try_setuid(uid);
    }
    Ok(())
}

/// Drops root's supplementary groups, leaving only the target gid, before
/// `setgid`/`setuid` -- otherwise a forked worker keeps every group root
/// was a member of.
fn try_setgroups(gid: Gid) {
    if let Err(e) = nix::unistd::setgroups(&[gid]) {
        warn!(error = %e, gid = gid.as_raw(), "setgroups failed, continuing with current supplementary groups");
    }
}

fn try_setgid(gid: Gid) {
    if let Err(e) = nix::unistd::setgid(gid) {
        warn!(error = %e, gid = gid.as_raw(), "setgid failed, continuing as current group");
    }
}

fn try_setuid(uid: Uid) {
    if let Err(e) = nix::unistd::setuid(uid) {
        warn!(error = %e, uid = uid.as_raw(), "setuid failed, continuing as current user");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_user_or_group_is_a_no_op() {
        assert!(drop_privileges(None, None).is_ok());
    }

    #[test]
    fn unknown_user_is_an_error() {
        let err = drop_privileges(Some("no-such-user-ipv6-dhcpd-test"), None);
        assert!(matches!(err, Err(PrivilegeError::UnknownUser(_))));
    }

    #[test]
    fn unknown_group_is_an_error() {
        let err = drop_privileges(None, Some("no-such-group-ipv6-dhcpd-test"));
        assert!(matches!(err, Err(PrivilegeError::UnknownGroup(_))));
    }
}
