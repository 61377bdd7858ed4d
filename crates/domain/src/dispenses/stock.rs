use std::sync::Arc;

use async_trait::async_trait;
use cqrs_es::EventEnvelope;
use derive_new::new;
use rust_decimal::Decimal;

use crate::{
    billing::LineItem,
    clinic::{Medicine, MedicineCatalog},
    errors::Error,
};

use super::{Dispense, Event};

/// Takes dispensed quantities out of pharmacy stock.
///
/// Runs after the dispense is committed. Lookup or save failures are logged
/// and never reach the caller; stock is allowed to drift.
#[derive(new)]
pub struct StockAdjuster {
    catalog: Arc<dyn MedicineCatalog>,
}

impl StockAdjuster {
    pub async fn adjust(&self, dispense_id: &str, items: &[LineItem]) {
        for item in items {
            if let Err(err) = self.adjust_item(item).await {
                tracing::warn!(
                    dispense_id,
                    medicine = %item.name,
                    error = %err,
                    "stock adjustment skipped"
                );
            }
        }
    }

    async fn adjust_item(&self, item: &LineItem) -> Result<(), Error> {
        let Some(medicine) = self.find(item).await? else {
            return Ok(());
        };

        let stock = remaining_stock(medicine.stock, item.quantity);
        self.catalog.set_stock(&medicine.id, stock).await
    }

    async fn find(&self, item: &LineItem) -> Result<Option<Medicine>, Error> {
        if item.strength.is_some() || item.form.is_some() {
            let exact = self
                .catalog
                .find_exact(&item.name, item.strength_or_empty(), item.form_or_empty())
                .await?;
            if exact.is_some() {
                return Ok(exact);
            }
        }

        self.catalog.find_by_name(&item.name).await
    }
}

/// Stock never goes below zero.
pub fn remaining_stock(stock: Decimal, quantity: Decimal) -> Decimal {
    (stock - quantity).max(Decimal::ZERO)
}

#[async_trait]
impl cqrs_es::Query<Dispense> for StockAdjuster {
    async fn dispatch(&self, dispense_id: &str, events: &[EventEnvelope<Dispense>]) {
        for event in events {
            if let Event::DispenseCreated { items, .. } = &event.payload {
                self.adjust(dispense_id, items).await;
            }
        }
    }
}
