use super::{ensure_owner, ReportStore};
use crate::error::{StoreError, StoreResult};
use crate::identity::AuthenticatedUser;
use crate::report::{NewSoilReport, ReportId, SoilReport};
use async_trait::async_trait;
use chrono::Utc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;

#[derive(Debug, Default)]
struct Inner {
    next_seq: u64,
    // (insertion sequence, report)
    rows: Vec<(u64, SoilReport)>,
}

/// In-process report store for development and tests.
#[derive(Debug, Default)]
pub struct MemoryReportStore {
    inner: RwLock<Inner>,
    simulate_unavailable: AtomicBool,
}

impl MemoryReportStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent call fail with `StoreError::Unavailable` until switched off.
    pub fn set_simulate_unavailable(&self, simulate: bool) {
        self.simulate_unavailable.store(simulate, Ordering::SeqCst);
    }

    /// Inserts a fully-formed report, keeping its `id` and `created_at`.
    pub async fn insert(&self, report: SoilReport) {
        let mut inner = self.inner.write().await;
        let seq = inner.next_seq;
        inner.next_seq += 1;
        inner.rows.push((seq, report));
    }

    fn check_available(&self) -> StoreResult<()> {
        if self.simulate_unavailable.load(Ordering::SeqCst) {
            Err(StoreError::Unavailable("simulated outage".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl ReportStore for MemoryReportStore {
    async fn save(
        &self,
        user: &AuthenticatedUser,
        report: NewSoilReport,
    ) -> StoreResult<SoilReport> {
        self.check_available()?;
        ensure_owner(user, &report)?;

        let stored = SoilReport::from_new(ReportId::generate(), Utc::now(), report);
        self.insert(stored.clone()).await;
        tracing::debug!(report_id = %stored.id, user_id = %user.id, "report saved");
        Ok(stored)
    }

    async fn list_by_user(&self, user: &AuthenticatedUser) -> StoreResult<Vec<SoilReport>> {
        self.check_available()?;

        let inner = self.inner.read().await;
        let mut rows: Vec<&(u64, SoilReport)> = inner
            .rows
            .iter()
            .filter(|(_, report)| report.user_id == user.id)
            .collect();
        rows.sort_by(|(a_seq, a), (b_seq, b)| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b_seq.cmp(a_seq))
        });
        Ok(rows.into_iter().map(|(_, report)| report.clone()).collect())
    }

    async fn delete_by_id(&self, user: &AuthenticatedUser, id: ReportId) -> StoreResult<()> {
        self.check_available()?;

        let mut inner = self.inner.write().await;
        let position = inner
            .rows
            .iter()
            .position(|(_, report)| report.id == id && report.user_id == user.id)
            .ok_or(StoreError::NotFound(id.uuid()))?;
        inner.rows.remove(position);
        tracing::debug!(report_id = %id, user_id = %user.id, "report deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::{ReportRequest, UserId};
    use agrihealth_types::{NonEmptyText, SoilType};
    use chrono::{DateTime, Duration};
    use uuid::Uuid;

    fn user(n: u128) -> AuthenticatedUser {
        AuthenticatedUser {
            id: UserId::new(Uuid::from_u128(n)),
            email: None,
            access_token: format!("token-{n}"),
        }
    }

    fn new_report(owner: &AuthenticatedUser, soil_type: SoilType) -> NewSoilReport {
        NewSoilReport::from_request(
            owner.id,
            &ReportRequest::new(soil_type),
            NonEmptyText::new(format!("## {soil_type}")).unwrap(),
        )
    }

    fn stored(owner: &AuthenticatedUser, soil_type: SoilType, at: DateTime<Utc>) -> SoilReport {
        SoilReport::from_new(ReportId::generate(), at, new_report(owner, soil_type))
    }

    #[tokio::test]
    async fn empty_store_lists_nothing() {
        let store = MemoryReportStore::new();
        assert!(store.list_by_user(&user(1)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn save_assigns_identity_and_lists_only_owner_reports() {
        let store = MemoryReportStore::new();
        let alice = user(1);
        let bob = user(2);

        let saved = store
            .save(&alice, new_report(&alice, SoilType::Clay))
            .await
            .unwrap();
        store
            .save(&bob, new_report(&bob, SoilType::Sandy))
            .await
            .unwrap();

        let listed = store.list_by_user(&alice).await.unwrap();
        assert_eq!(listed, vec![saved]);
    }

    #[tokio::test]
    async fn save_for_another_user_is_forbidden() {
        let store = MemoryReportStore::new();
        let result = store.save(&user(1), new_report(&user(2), SoilType::Loam)).await;
        assert!(matches!(result, Err(StoreError::Forbidden)));
        assert!(store.list_by_user(&user(2)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn list_is_newest_first_with_stable_ties() {
        let store = MemoryReportStore::new();
        let owner = user(1);
        let t0 = Utc::now();

        let old = stored(&owner, SoilType::Clay, t0 - Duration::days(2));
        let tie_first = stored(&owner, SoilType::Silt, t0);
        let tie_second = stored(&owner, SoilType::Peaty, t0);
        let middle = stored(&owner, SoilType::Loam, t0 - Duration::days(1));
        for report in [&old, &tie_first, &tie_second, &middle] {
            store.insert(report.clone()).await;
        }

        let ids: Vec<ReportId> = store
            .list_by_user(&owner)
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(ids, vec![tie_second.id, tie_first.id, middle.id, old.id]);

        let again: Vec<ReportId> = store
            .list_by_user(&owner)
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(ids, again);
    }

    #[tokio::test]
    async fn delete_removes_report_from_listing() {
        let store = MemoryReportStore::new();
        let owner = user(1);
        let keep = store
            .save(&owner, new_report(&owner, SoilType::Chalky))
            .await
            .unwrap();
        let gone = store
            .save(&owner, new_report(&owner, SoilType::Clay))
            .await
            .unwrap();

        store.delete_by_id(&owner, gone.id).await.unwrap();

        let listed = store.list_by_user(&owner).await.unwrap();
        assert_eq!(listed, vec![keep]);
    }

    #[tokio::test]
    async fn delete_unknown_or_foreign_report_is_not_found() {
        let store = MemoryReportStore::new();
        let owner = user(1);
        let saved = store
            .save(&owner, new_report(&owner, SoilType::Clay))
            .await
            .unwrap();

        assert!(matches!(
            store.delete_by_id(&user(2), saved.id).await,
            Err(StoreError::NotFound(_))
        ));
        assert!(matches!(
            store.delete_by_id(&owner, ReportId::generate()).await,
            Err(StoreError::NotFound(_))
        ));
        assert_eq!(store.list_by_user(&owner).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn simulated_outage_fails_every_call() {
        let store = MemoryReportStore::new();
        let owner = user(1);
        store.set_simulate_unavailable(true);

        assert!(matches!(
            store.save(&owner, new_report(&owner, SoilType::Clay)).await,
            Err(StoreError::Unavailable(_))
        ));
        assert!(matches!(
            store.list_by_user(&owner).await,
            Err(StoreError::Unavailable(_))
        ));

        store.set_simulate_unavailable(false);
        assert!(store.list_by_user(&owner).await.unwrap().is_empty());
    }
}
