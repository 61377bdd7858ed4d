use std::sync::Arc;

use cqrs_es::{persist::PersistedEventStore, CqrsFramework, EventStore, Query};
use dynamo_es::DynamoEventRepository;

use crate::{
    clinic::{dynamo::DynamoClinic, Clinic},
    config::Config,
};

use super::{
    appointment_marker::AppointmentMarker, dynamo::DynamoDispenseViews, resolver::Resolver,
    stock::StockAdjuster, view::DispenseViewStore, view::ViewProjector, Dispensary, Dispense,
    Services,
};

pub type DynamoEventStore = PersistedEventStore<DynamoEventRepository, Dispense>;

/// Queries run in order after every commit: the read model first, then the
/// best-effort side effects.
pub fn queries<ES>(
    views: Arc<dyn DispenseViewStore>,
    history: Arc<ES>,
    clinic: &Clinic,
) -> Vec<Box<dyn Query<Dispense>>>
where
    ES: EventStore<Dispense> + 'static,
{
    vec![
        Box::new(ViewProjector::new(views, history)),
        Box::new(StockAdjuster::new(clinic.catalog.clone())),
        Box::new(AppointmentMarker::new(clinic.appointments.clone())),
    ]
}

pub fn framework<ES>(
    store: ES,
    history: Arc<ES>,
    views: Arc<dyn DispenseViewStore>,
    clinic: Clinic,
) -> CqrsFramework<Dispense, ES>
where
    ES: EventStore<Dispense> + 'static,
{
    let services = Services::new(Resolver::new(
        clinic.patients.clone(),
        clinic.appointments.clone(),
    ));

    CqrsFramework::new(store, queries(views, history, &clinic), services)
}

fn event_store(client: &aws_sdk_dynamodb::Client, config: &Config) -> DynamoEventStore {
    let tables = &config.tables;

    PersistedEventStore::new_snapshot_store(
        DynamoEventRepository::new(client.clone())
            .with_tables(&tables.event_log, &tables.event_snapshots),
        config.snapshot_size,
    )
}

pub fn init(client: aws_sdk_dynamodb::Client, config: &Config) -> Arc<Dispensary<DynamoEventStore>> {
    let tables = &config.tables;
    let store = event_store(&client, config);
    let history = event_store(&client, config);

    let views: Arc<dyn DispenseViewStore> = Arc::new(DynamoDispenseViews::new(
        client.clone(),
        tables.dispenses_view.clone(),
    ));

    let dynamo = Arc::new(DynamoClinic::new(client, tables.clone()));
    let clinic = Clinic::new(dynamo.clone(), dynamo.clone(), dynamo.clone(), dynamo);

    Arc::new(Dispensary::new(store, history, views, clinic))
}
