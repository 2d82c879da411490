use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Default)]
pub struct Metrics {
    stock_mutations: AtomicU64,
    sales: AtomicU64,
    ledger_conflicts: AtomicU64,
    discrepancies: AtomicU64,
    notifications: AtomicU64,
    price_batches: AtomicU64,
    price_items_processed: AtomicU64,
    price_items_failed: AtomicU64,
}

impl Metrics {
    pub fn record_stock_mutation(&self, discrepancy: bool) {
        self.stock_mutations.fetch_add(1, Ordering::Relaxed);
        if discrepancy {
            self.discrepancies.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_sale(&self, discrepancy: bool) {
        self.sales.fetch_add(1, Ordering::Relaxed);
        if discrepancy {
            self.discrepancies.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_ledger_conflict(&self) {
        self.ledger_conflicts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_notifications(&self, count: usize) {
        self.notifications.fetch_add(count as u64, Ordering::Relaxed);
    }

    pub fn record_price_batch(&self, processed: usize, failed: usize) {
        self.price_batches.fetch_add(1, Ordering::Relaxed);
        self.price_items_processed
            .fetch_add(processed as u64, Ordering::Relaxed);
        self.price_items_failed
            .fetch_add(failed as u64, Ordering::Relaxed);
    }

    pub fn render_prometheus(&self) -> String {
        let mutations = self.stock_mutations.load(Ordering::Relaxed);
        let sales = self.sales.load(Ordering::Relaxed);
        let conflicts = self.ledger_conflicts.load(Ordering::Relaxed);
        let discrepancies = self.discrepancies.load(Ordering::Relaxed);
        let notifications = self.notifications.load(Ordering::Relaxed);
        let batches = self.price_batches.load(Ordering::Relaxed);
        let processed = self.price_items_processed.load(Ordering::Relaxed);
        let failed = self.price_items_failed.load(Ordering::Relaxed);

        format!(
            "# TYPE stockwell_stock_mutations_total counter\n\
stockwell_stock_mutations_total {}\n\
# TYPE stockwell_sales_total counter\n\
stockwell_sales_total {}\n\
# TYPE stockwell_ledger_conflicts_total counter\n\
stockwell_ledger_conflicts_total {}\n\
# TYPE stockwell_discrepancies_total counter\n\
stockwell_discrepancies_total {}\n\
# TYPE stockwell_notifications_total counter\n\
stockwell_notifications_total {}\n\
# TYPE stockwell_price_batches_total counter\n\
stockwell_price_batches_total {}\n\
# TYPE stockwell_price_items_processed_total counter\n\
stockwell_price_items_processed_total {}\n\
# TYPE stockwell_price_items_failed_total counter\n\
stockwell_price_items_failed_total {}\n",
            mutations, sales, conflicts, discrepancies, notifications, batches, processed, failed
        )
    }
}
