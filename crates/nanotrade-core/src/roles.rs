//! # Roles & Permissions
//!
//! ```text
//! Permission        ShopOwner  Manager  Seller
//! ───────────────   ─────────  ───────  ──────
//! ViewCatalog           ✓         ✓       ✓
//! UsePos                ✓         ✓       ✓
//! ManageCatalog         ✓         ✓
//! ManageInventory       ✓         ✓
//! ViewReports           ✓         ✓
//! ManageShop            ✓
//! ManageEscrow          ✓
//! ManageStaff           ✓
//! ```

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS, Default)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    /// Registers the business and owns its shops.
    #[default]
    #[serde(alias = "shop owner")]
    ShopOwner,
    Manager,
    Seller,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    ViewCatalog,
    UsePos,
    ManageCatalog,
    ManageInventory,
    ViewReports,
    ManageShop,
    ManageEscrow,
    ManageStaff,
}

impl Permission {
    fn describe(&self) -> &'static str {
        match self {
            Permission::ViewCatalog => "view the catalog",
            Permission::UsePos => "use the point of sale",
            Permission::ManageCatalog => "manage the catalog",
            Permission::ManageInventory => "manage inventory",
            Permission::ViewReports => "view reports",
            Permission::ManageShop => "manage shops",
            Permission::ManageEscrow => "manage escrow funds",
            Permission::ManageStaff => "manage staff",
        }
    }
}

impl UserRole {
    pub fn allows(&self, permission: Permission) -> bool {
        match self {
            UserRole::ShopOwner => true,
            UserRole::Manager => !matches!(
                permission,
                Permission::ManageShop | Permission::ManageEscrow | Permission::ManageStaff
            ),
            UserRole::Seller => matches!(permission, Permission::ViewCatalog | Permission::UsePos),
        }
    }

    /// Fails with [`CoreError::PermissionDenied`] unless the role has
    /// `permission`.
    pub fn require(&self, permission: Permission) -> CoreResult<()> {
        if self.allows(permission) {
            Ok(())
        } else {
            Err(CoreError::PermissionDenied {
                role: self.as_str().to_string(),
                action: permission.describe().to_string(),
            })
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::ShopOwner => "shop_owner",
            UserRole::Manager => "manager",
            UserRole::Seller => "seller",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [Permission; 8] = [
        Permission::ViewCatalog,
        Permission::UsePos,
        Permission::ManageCatalog,
        Permission::ManageInventory,
        Permission::ViewReports,
        Permission::ManageShop,
        Permission::ManageEscrow,
        Permission::ManageStaff,
    ];

    #[test]
    fn test_owner_has_everything() {
        assert!(ALL.iter().all(|p| UserRole::ShopOwner.allows(*p)));
    }

    #[test]
    fn test_manager_cannot_touch_shop_escrow_or_staff() {
        let denied: Vec<_> = ALL
            .iter()
            .filter(|p| !UserRole::Manager.allows(**p))
            .copied()
            .collect();
        assert_eq!(
            denied,
            vec![
                Permission::ManageShop,
                Permission::ManageEscrow,
                Permission::ManageStaff
            ]
        );
    }

    #[test]
    fn test_seller_only_sells() {
        assert!(UserRole::Seller.require(Permission::UsePos).is_ok());
        assert!(UserRole::Seller.allows(Permission::ViewCatalog));

        let err = UserRole::Seller
            .require(Permission::ManageCatalog)
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Role seller is not allowed to manage the catalog"
        );
    }

    #[test]
    fn test_legacy_role_spelling_is_accepted() {
        let role: UserRole = serde_json::from_str("\"shop owner\"").unwrap();
        assert_eq!(role, UserRole::ShopOwner);
        assert_eq!(serde_json::to_string(&role).unwrap(), "\"shop_owner\"");
    }
}
