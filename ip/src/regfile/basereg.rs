//! Base registers describe the banks a processor can currently
//! address: their storage location, relative-address limits, and the
//! ring/domain access control applied to them.

use serde::Serialize;

use crate::storage::AbsoluteAddress;

/// A ring/domain pair.  Lower ring values are more privileged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct AccessInfo {
    pub ring: u8,
    pub domain: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct AccessPermissions {
    pub enter: bool,
    pub read: bool,
    pub write: bool,
}

impl AccessPermissions {
    #[must_use]
    pub const fn all() -> AccessPermissions {
        AccessPermissions {
            enter: true,
            read: true,
            write: true,
        }
    }

    #[must_use]
    pub const fn none() -> AccessPermissions {
        AccessPermissions {
            enter: false,
            read: false,
            write: false,
        }
    }

    #[must_use]
    pub const fn read_only() -> AccessPermissions {
        AccessPermissions {
            enter: false,
            read: true,
            write: false,
        }
    }
}

/// One of the 32 base registers.
///
/// Voidness is not stored: a register is void exactly when its
/// normalized lower limit exceeds its upper limit, so the invariant
/// between the two cannot be broken by any construction path.
///
/// The base address is pre-adjusted downward by the lower limit, so
/// that `base + relative` addressing works for banks whose first
/// word sits at a non-zero relative address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BaseRegister {
    access_lock: AccessInfo,
    base_address: AbsoluteAddress,
    general_permissions: AccessPermissions,
    special_permissions: AccessPermissions,
    large_size: bool,
    lower_limit_normalized: u32,
    upper_limit_normalized: u32,
}

impl BaseRegister {
    /// A register describing no bank at all.
    #[must_use]
    pub const fn void() -> BaseRegister {
        BaseRegister {
            access_lock: AccessInfo { ring: 0, domain: 0 },
            base_address: AbsoluteAddress::new(0, 0),
            general_permissions: AccessPermissions::none(),
            special_permissions: AccessPermissions::none(),
            large_size: false,
            lower_limit_normalized: 1,
            upper_limit_normalized: 0,
        }
    }

    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub const fn new(
        base_address: AbsoluteAddress,
        large_size: bool,
        lower_limit_normalized: u32,
        upper_limit_normalized: u32,
        access_lock: AccessInfo,
        general_permissions: AccessPermissions,
        special_permissions: AccessPermissions,
    ) -> BaseRegister {
        BaseRegister {
            access_lock,
            base_address,
            general_permissions,
            special_permissions,
            large_size,
            lower_limit_normalized,
            upper_limit_normalized,
        }
    }

    #[must_use]
    pub const fn is_void(&self) -> bool {
        self.lower_limit_normalized > self.upper_limit_normalized
    }

    #[must_use]
    pub const fn large_size(&self) -> bool {
        self.large_size
    }

    #[must_use]
    pub const fn lower_limit_normalized(&self) -> u32 {
        self.lower_limit_normalized
    }

    #[must_use]
    pub const fn upper_limit_normalized(&self) -> u32 {
        self.upper_limit_normalized
    }

    #[must_use]
    pub const fn access_lock(&self) -> AccessInfo {
        self.access_lock
    }

    #[must_use]
    pub const fn base_address(&self) -> AbsoluteAddress {
        self.base_address
    }

    /// Does `relative` fall inside the bank's limits?
    #[must_use]
    pub const fn contains(&self, relative: u32) -> bool {
        !self.is_void()
            && relative >= self.lower_limit_normalized
            && relative <= self.upper_limit_normalized
    }

    /// Map an in-limits relative address to storage.
    #[must_use]
    pub fn absolute_address(&self, relative: u32) -> AbsoluteAddress {
        debug_assert!(self.contains(relative));
        self.base_address
            .offset_by(relative - self.lower_limit_normalized)
    }

    /// The permissions which apply to an access made under `key`:
    /// special permissions for a more-privileged ring or the same
    /// domain, general permissions otherwise.
    #[must_use]
    pub const fn effective_permissions(&self, key: AccessInfo) -> AccessPermissions {
        if key.ring < self.access_lock.ring || key.domain == self.access_lock.domain {
            self.special_permissions
        } else {
            self.general_permissions
        }
    }
}

impl Default for BaseRegister {
    fn default() -> BaseRegister {
        BaseRegister::void()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_bank() -> BaseRegister {
        BaseRegister::new(
            AbsoluteAddress::new(0, 0o1000),
            false,
            0o40,
            0o177,
            AccessInfo { ring: 2, domain: 7 },
            AccessPermissions::read_only(),
            AccessPermissions::all(),
        )
    }

    #[test]
    fn test_void_register_invariant() {
        let void = BaseRegister::void();
        assert!(void.is_void());
        assert!(void.lower_limit_normalized() > void.upper_limit_normalized());
        assert!(!void.contains(0));
    }

    #[test]
    fn test_constructed_register_invariant() {
        let bank = sample_bank();
        assert!(!bank.is_void());
        assert_eq!(
            bank.is_void(),
            bank.lower_limit_normalized() > bank.upper_limit_normalized()
        );
    }

    #[test]
    fn test_limits() {
        let bank = sample_bank();
        assert!(!bank.contains(0o37));
        assert!(bank.contains(0o40));
        assert!(bank.contains(0o177));
        assert!(!bank.contains(0o200));
    }

    #[test]
    fn test_absolute_address_subtracts_lower_limit() {
        let bank = sample_bank();
        assert_eq!(bank.absolute_address(0o40), AbsoluteAddress::new(0, 0o1000));
        assert_eq!(bank.absolute_address(0o50), AbsoluteAddress::new(0, 0o1010));
    }

    #[test]
    fn test_effective_permissions() {
        let bank = sample_bank();
        // More privileged ring: special permissions.
        let master = AccessInfo { ring: 0, domain: 1 };
        assert_eq!(bank.effective_permissions(master), AccessPermissions::all());
        // Same domain: special permissions.
        let peer = AccessInfo { ring: 3, domain: 7 };
        assert_eq!(bank.effective_permissions(peer), AccessPermissions::all());
        // Less privileged, different domain: general permissions.
        let user = AccessInfo { ring: 3, domain: 9 };
        assert_eq!(
            bank.effective_permissions(user),
            AccessPermissions::read_only()
        );
    }
}
