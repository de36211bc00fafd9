//! Entities that live in the store

use serde::Serialize;
use serde::de::DeserializeOwned;
use shared::message::Collection;
use shared::models::{
    Account, AccountInfo, Booking, DiningTable, Feedback, Notification, Order, PaymentTransaction,
    StaffInvite, StaffMember, TableHistoryEntry,
};

/// A stored entity: keyed by `id`, guarded by `version`.
///
/// The store owns the version. `insert` sets it to 1 and every successful
/// `update` increments it; callers only ever hand back what they read.
pub trait Record: Serialize + DeserializeOwned + Send + Sync + 'static {
    const COLLECTION: Collection;

    fn id(&self) -> &str;

    fn version(&self) -> u64;

    fn set_version(&mut self, version: u64);

    /// Entity data carried by change records (log and bus)
    fn change_data(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::to_value(self)
    }
}

macro_rules! impl_record {
    ($($ty:ty => $collection:expr),* $(,)?) => {
        $(
            impl Record for $ty {
                const COLLECTION: Collection = $collection;

                fn id(&self) -> &str {
                    &self.id
                }

                fn version(&self) -> u64 {
                    self.version
                }

                fn set_version(&mut self, version: u64) {
                    self.version = version;
                }
            }
        )*
    };
}

impl_record! {
    Booking => Collection::Bookings,
    Order => Collection::Orders,
    DiningTable => Collection::Tables,
    StaffMember => Collection::Staff,
    StaffInvite => Collection::Invites,
    PaymentTransaction => Collection::Payments,
    Feedback => Collection::Feedback,
    Notification => Collection::Notifications,
    TableHistoryEntry => Collection::TableHistory,
}

impl Record for Account {
    const COLLECTION: Collection = Collection::Accounts;

    fn id(&self) -> &str {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }

    fn set_version(&mut self, version: u64) {
        self.version = version;
    }

    /// Password hashes never leave the accounts table
    fn change_data(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::to_value(AccountInfo::from(self))
    }
}
