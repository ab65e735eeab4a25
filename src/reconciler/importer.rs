use std::collections::{BTreeSet, HashMap};
use std::future::Future;
use std::sync::Arc;

use chrono::{DateTime, TimeDelta, Utc};
use rust_decimal::Decimal;
use serde_json::Value;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::Settings;
use crate::identity::id_field;
use crate::models::{
    Attachment, Installment, InstallmentMetadata, InstallmentStatus, SaleMetadata, SaleRecord, SaleTransactionLink,
    Transaction, TransactionMetadata, TransactionStatus, TransactionType
};
use crate::reconciler::{ImportDetail, ImportError, ImportOutcome, ImportReport, SaleError};
use crate::source::{normalize_sale, ExternalAttachment, ExternalPayment, ExternalSale};
use crate::storage::{with_deadline, LedgerStore, StoreResult};
use crate::types::{ExternalId, RecordId};

/// What the importer knows about a sale record that already exists.
struct KnownSale {
    sale_id: RecordId,
    user_id: String,
    code: String,
    date: DateTime<Utc>,
    payment_ids: BTreeSet<String>,
    attachment_ids: BTreeSet<String>,
    /// Transaction hosting the sale's attachments, once looked up or created.
    host_transaction: Option<RecordId>
}

impl KnownSale {
    fn from_record(record: &SaleRecord) -> Self {
        Self {
            sale_id: record.id,
            user_id: record.user_id.clone(),
            code: record.code.clone(),
            date: record.date,
            payment_ids: record.metadata.processed_payment_ids.clone(),
            attachment_ids: record.metadata.processed_attachment_ids.clone(),
            host_transaction: None
        }
    }
}

/// One synthesized installment, computed before anything is written.
struct Tranche {
    number: u32,
    amount: Decimal,
    due_date: DateTime<Utc>
}

/// Child records still to be materialized for one sale.
struct Pending<'a> {
    payments: Vec<&'a ExternalPayment>,
    attachments: Vec<&'a ExternalAttachment>,
    schedule: Vec<Tranche>
}

impl Pending<'_> {
    fn is_empty(&self) -> bool {
        self.payments.is_empty() && self.attachments.is_empty() && self.schedule.is_empty()
    }
}

#[derive(Debug, Default)]
struct Progress {
    installments: usize,
    attachments: usize
}

/// Idempotent ingestion of external sales into the ledger.
///
/// Replaying a batch, or a batch that overlaps an earlier one, only adds the
/// payments and attachments that were not materialized before.
pub struct SalesImporter<S: LedgerStore> {
    store: Arc<S>,
    settings: Settings
}

impl<S: LedgerStore> SalesImporter<S> {
    pub fn new(store: Arc<S>, settings: Settings) -> Self {
        Self { store, settings }
    }

    /// Imports a batch of raw sale payloads for `user_id`.
    ///
    /// Sales are processed in input order. A failing sale is counted and
    /// reported in the details; the rest of the batch still runs.
    ///
    /// # Errors
    /// Returns `ImportError` if the existing records cannot be loaded or if
    /// one of them belongs to a different user. Nothing is written in either case.
    pub async fn import_sales(&self, user_id: &str, sales: Vec<Value>) -> Result<ImportReport, ImportError> {
        let existing = self.call(self.store.find_sales(user_id, &self.settings.source_tag)).await
            .map_err(|source| ImportError::LoadFailed { user_id: user_id.to_string(), source })?;

        let mut index = HashMap::<ExternalId, KnownSale>::with_capacity(existing.len());

        for record in &existing {
            if record.user_id != user_id {
                return Err(ImportError::Unauthorized {
                    user_id: user_id.to_string(),
                    owner: record.user_id.clone(),
                    sale_id: record.id
                });
            }

            if let Some(external_id) = &record.external_id {
                index.entry(external_id.clone()).or_insert_with(|| KnownSale::from_record(record));
            }
        }

        let mut report = ImportReport::new(self.settings.max_details);

        for raw in &sales {
            match self.import_sale(user_id, raw, &mut index).await {
                Ok(detail) => report.record(detail),
                Err(error) => {
                    let external_id = id_field(raw.get("id"));
                    warn!("Sale [{}] for user [{user_id}] failed: {error}", external_id.as_deref().unwrap_or("?"));

                    report.record(ImportDetail {
                        external_id,
                        sale_id: None,
                        outcome: ImportOutcome::Failed { reason: error.to_string() }
                    });
                }
            }
        }

        info!(
            "Import for user [{user_id}] finished: imported [{}] skipped [{}] errors [{}]",
            report.imported, report.skipped, report.errors
        );

        Ok(report)
    }

    async fn import_sale(&self, user_id: &str, raw: &Value, index: &mut HashMap<ExternalId, KnownSale>) -> Result<ImportDetail, SaleError> {
        let sale = normalize_sale(raw)?;

        if let Some(known) = sale.external_id.as_ref().and_then(|external_id| index.get_mut(external_id)) {
            return self.extend_sale(known, &sale).await;
        }

        let record = self.new_record(user_id, &sale);
        let schedule = match sale.installment_count {
            Some(count) if sale.payments.is_empty() => self.installment_schedule(&sale, count, record.date)?,
            _ => Vec::new()
        };

        let record = self.call(self.store.create_sale(record)).await?;
        debug!("Sale record [{}] created for external sale [{:?}]", record.id, sale.external_id);

        let pending = Pending {
            payments: unique_payments(&sale.payments, &BTreeSet::new()),
            attachments: unique_attachments(&sale.attachments, &BTreeSet::new()),
            schedule
        };

        let mut local = KnownSale::from_record(&record);
        let known = match &sale.external_id {
            Some(external_id) => index.entry(external_id.clone()).or_insert(local),
            None => &mut local
        };

        let progress = self.materialize(known, &sale, pending).await?;

        Ok(ImportDetail {
            external_id: sale.external_id.clone(),
            sale_id: Some(record.id),
            outcome: ImportOutcome::Created {
                installments: progress.installments,
                attachments: progress.attachments
            }
        })
    }

    async fn extend_sale(&self, known: &mut KnownSale, sale: &ExternalSale) -> Result<ImportDetail, SaleError> {
        let pending = Pending {
            payments: unique_payments(&sale.payments, &known.payment_ids),
            attachments: unique_attachments(&sale.attachments, &known.attachment_ids),
            schedule: Vec::new()
        };

        if pending.is_empty() {
            debug!("External sale [{:?}] has nothing new, skipping", sale.external_id);

            return Ok(ImportDetail {
                external_id: sale.external_id.clone(),
                sale_id: Some(known.sale_id),
                outcome: ImportOutcome::Skipped
            });
        }

        let progress = self.materialize(known, sale, pending).await?;

        Ok(ImportDetail {
            external_id: sale.external_id.clone(),
            sale_id: Some(known.sale_id),
            outcome: ImportOutcome::Extended {
                installments: progress.installments,
                attachments: progress.attachments
            }
        })
    }

    /// Creates the pending child records, then merges the ids that made it
    /// into the sale metadata. The merge also runs after a failure so a
    /// retry does not create the same children twice.
    async fn materialize(&self, known: &mut KnownSale, sale: &ExternalSale, pending: Pending<'_>) -> Result<Progress, SaleError> {
        let mut patch = SaleMetadata {
            raw_source_payload: Some(sale.raw.clone()),
            last_synced_at: Some(Utc::now()),
            ..SaleMetadata::default()
        };

        let created = self.create_children(known, sale, pending, &mut patch).await;
        let merged = self.call(self.store.merge_sale_metadata(known.sale_id, &patch)).await;

        if merged.is_ok() {
            known.payment_ids.extend(patch.processed_payment_ids);
            known.attachment_ids.extend(patch.processed_attachment_ids);
        }

        let progress = created?;
        merged?;

        Ok(progress)
    }

    async fn create_children(&self, known: &mut KnownSale, sale: &ExternalSale, pending: Pending<'_>, patch: &mut SaleMetadata) -> Result<Progress, SaleError> {
        let mut progress = Progress::default();

        for tranche in pending.schedule {
            self.call(self.store.create_installment(synthesized_installment(known, &tranche))).await?;
            patch.synthesized_installments = tranche.number;
            progress.installments += 1;
        }

        if !pending.payments.is_empty() {
            let mut number = self.next_installment_number(known.sale_id).await?;

            for payment in pending.payments {
                self.call(self.store.create_installment(payment_installment(known, sale, payment, number))).await?;
                patch.processed_payment_ids.insert(payment.id.clone());
                progress.installments += 1;
                number += 1;
            }
        }

        for attachment in pending.attachments {
            let host_transaction = self.host_transaction(known).await?;

            self.call(self.store.create_attachment(Attachment {
                id: Uuid::new_v4(),
                transaction_id: host_transaction,
                sale_id: Some(known.sale_id),
                external_id: Some(attachment.id.clone()),
                name: attachment.name.clone(),
                url: attachment.url.clone(),
                mime_type: attachment.mime_type.clone(),
                size: attachment.size,
                created_at: Utc::now()
            })).await?;

            patch.processed_attachment_ids.insert(attachment.id.clone());
            progress.attachments += 1;
        }

        Ok(progress)
    }

    /// Splits the sale total evenly over the announced installment count.
    /// The last installment absorbs the rounding remainder.
    ///
    /// Counts above the configured limit and due dates past the supported
    /// range fail the sale before any record is written.
    fn installment_schedule(&self, sale: &ExternalSale, count: u32, sale_date: DateTime<Utc>) -> Result<Vec<Tranche>, SaleError> {
        if count > self.settings.max_installments {
            return Err(SaleError::TooManyInstallments { count, limit: self.settings.max_installments });
        }

        let interval = i64::from(sale.interval_days.unwrap_or(self.settings.default_interval_days));
        let first_due = sale.first_installment_date.unwrap_or(sale_date);
        let share = (sale.total_amount / Decimal::from(count)).round_dp(2);
        let mut allocated = Decimal::ZERO;
        let mut schedule = Vec::with_capacity(count as usize);

        for position in 0..count {
            let number = position + 1;
            let amount = if number == count { sale.total_amount - allocated } else { share };
            allocated += amount;

            let due_date = interval.checked_mul(i64::from(position))
                .and_then(TimeDelta::try_days)
                .and_then(|offset| first_due.checked_add_signed(offset))
                .ok_or(SaleError::DueDateOutOfRange { number })?;

            schedule.push(Tranche { number, amount, due_date });
        }

        Ok(schedule)
    }

    async fn next_installment_number(&self, sale_id: RecordId) -> Result<u32, SaleError> {
        let existing = self.call(self.store.find_installments(sale_id)).await?;
        let highest = existing.iter().map(|installment| installment.number).max().unwrap_or(0);

        Ok(highest + 1)
    }

    /// Finds the transaction hosting the sale's attachments, creating a
    /// zero-amount placeholder and its link when there is none.
    async fn host_transaction(&self, known: &mut KnownSale) -> Result<RecordId, SaleError> {
        if let Some(transaction_id) = known.host_transaction {
            return Ok(transaction_id);
        }

        if let Some(link) = self.call(self.store.find_sale_link(known.sale_id)).await? {
            if self.call(self.store.transaction_exists(link.transaction_id)).await? {
                known.host_transaction = Some(link.transaction_id);
                return Ok(link.transaction_id);
            }

            warn!("Sale [{}] links to missing transaction [{}], creating a new host", known.sale_id, link.transaction_id);
        }

        let transaction = self.call(self.store.create_transaction(Transaction {
            id: Uuid::new_v4(),
            user_id: known.user_id.clone(),
            name: format!("Anexos da venda {}", known.code),
            amount: Decimal::ZERO,
            date: known.date,
            transaction_type: TransactionType::Deposit,
            status: TransactionStatus::Completed,
            wallet_id: None,
            metadata: TransactionMetadata {
                source: Some(self.settings.source_tag.clone()),
                attachment_only: true,
                sale_id: Some(known.sale_id),
                ..TransactionMetadata::default()
            },
            created_at: Utc::now()
        })).await?;

        self.call(self.store.create_sale_link(SaleTransactionLink {
            id: Uuid::new_v4(),
            sale_id: known.sale_id,
            transaction_id: transaction.id,
            created_at: Utc::now()
        })).await?;

        debug!("Placeholder transaction [{}] hosts attachments of sale [{}]", transaction.id, known.sale_id);
        known.host_transaction = Some(transaction.id);

        Ok(transaction.id)
    }

    fn new_record(&self, user_id: &str, sale: &ExternalSale) -> SaleRecord {
        let now = Utc::now();
        let id = Uuid::new_v4();

        // Placeholder transactions are named after the code, so it is never left blank.
        let code = match sale.code.trim() {
            "" => id.to_string(),
            code => code.to_string()
        };

        SaleRecord {
            id,
            user_id: user_id.to_string(),
            external_id: sale.external_id.clone(),
            code,
            date: sale.date.unwrap_or(now),
            total_amount: sale.total_amount,
            net_amount: sale.net_amount,
            status: sale.status.clone(),
            customer_name: sale.customer_name.clone(),
            store_name: sale.store_name.clone(),
            source: self.settings.source_tag.clone(),
            metadata: SaleMetadata {
                raw_source_payload: Some(sale.raw.clone()),
                last_synced_at: Some(now),
                ..SaleMetadata::default()
            },
            created_at: now,
            updated_at: now
        }
    }

    async fn call<T>(&self, call: impl Future<Output = StoreResult<T>>) -> StoreResult<T> {
        with_deadline(self.settings.call_timeout, call).await
    }
}

fn synthesized_installment(known: &KnownSale, tranche: &Tranche) -> Installment {
    Installment {
        id: Uuid::new_v4(),
        sale_id: known.sale_id,
        number: tranche.number,
        amount: tranche.amount,
        due_date: tranche.due_date,
        status: InstallmentStatus::Pending,
        external_payment_id: None,
        metadata: InstallmentMetadata {
            raw_source_payload: None,
            payment_method: None,
            synthesized: true
        },
        created_at: Utc::now()
    }
}

fn payment_installment(known: &KnownSale, sale: &ExternalSale, payment: &ExternalPayment, number: u32) -> Installment {
    Installment {
        id: Uuid::new_v4(),
        sale_id: known.sale_id,
        number,
        amount: payment.amount,
        due_date: payment.due_date.or(sale.date).unwrap_or(known.date),
        status: InstallmentStatus::from_label(payment.status.as_deref()),
        external_payment_id: Some(payment.id.clone()),
        metadata: InstallmentMetadata {
            raw_source_payload: Some(payment.raw.clone()),
            payment_method: payment.method.clone(),
            synthesized: false
        },
        created_at: Utc::now()
    }
}

/// Payments not yet processed, each id taken once even if the payload repeats it.
fn unique_payments<'a>(payments: &'a [ExternalPayment], processed: &BTreeSet<String>) -> Vec<&'a ExternalPayment> {
    let mut seen = BTreeSet::new();

    payments.iter()
        .filter(|payment| !processed.contains(&payment.id) && seen.insert(payment.id.clone()))
        .collect()
}

fn unique_attachments<'a>(attachments: &'a [ExternalAttachment], processed: &BTreeSet<String>) -> Vec<&'a ExternalAttachment> {
    let mut seen = BTreeSet::new();

    attachments.iter()
        .filter(|attachment| !processed.contains(&attachment.id) && seen.insert(attachment.id.clone()))
        .collect()
}
