use async_trait::async_trait;

use crate::database::manager::DatabaseError;
use crate::database::models::{
    Address, AddressRecord, Client, ClientRecord, Delivery, DeliveryFilter, NewDelivery, NewOrder,
    Order, OrderFilter, OrderMeasures, Page, Phone,
};
use crate::types::DeliveryStatus;

/// Persistence operations behind the HTTP handlers.
///
/// `find_*` return `Ok(None)` for unknown ids; the handlers turn that into a
/// 404. `update_*` and `delete_*` return the number of rows actually changed,
/// so an update that writes identical values reports `0`.
#[async_trait]
pub trait Repository: Send + Sync {
    async fn ping(&self) -> Result<(), DatabaseError>;

    // Clients
    async fn list_clients(&self, page: Page) -> Result<Vec<Client>, DatabaseError>;
    async fn find_client(&self, id: i32) -> Result<Option<Client>, DatabaseError>;
    async fn find_client_by_cpf(&self, cpf: &str) -> Result<Option<Client>, DatabaseError>;
    async fn find_client_by_email(&self, email: &str) -> Result<Option<Client>, DatabaseError>;
    /// Registers the client together with its first phone and address
    async fn create_client(
        &self,
        client: &ClientRecord,
        phone: &str,
        address: &AddressRecord,
    ) -> Result<Client, DatabaseError>;
    async fn update_client(&self, id: i32, client: &ClientRecord) -> Result<u64, DatabaseError>;
    /// Removes the client with its phones and addresses
    async fn delete_client(&self, id: i32) -> Result<u64, DatabaseError>;
    async fn count_orders_for_client(&self, id: i32) -> Result<i64, DatabaseError>;

    // Phones
    async fn list_phones(&self, client_id: i32) -> Result<Vec<Phone>, DatabaseError>;
    async fn find_phone(&self, id: i32) -> Result<Option<Phone>, DatabaseError>;
    async fn find_phone_by_number(&self, number: &str) -> Result<Option<Phone>, DatabaseError>;
    async fn create_phone(&self, client_id: i32, number: &str) -> Result<Phone, DatabaseError>;
    async fn update_phone(&self, id: i32, number: &str) -> Result<u64, DatabaseError>;
    /// Deletes the phone unless it is the last one of its client; 0 when nothing was removed
    async fn delete_phone(&self, id: i32) -> Result<u64, DatabaseError>;

    // Addresses
    async fn list_addresses(&self, client_id: i32) -> Result<Vec<Address>, DatabaseError>;
    async fn find_address(&self, id: i32) -> Result<Option<Address>, DatabaseError>;
    async fn find_client_address(
        &self,
        client_id: i32,
        cep: &str,
        number: &str,
    ) -> Result<Option<Address>, DatabaseError>;
    async fn create_address(
        &self,
        client_id: i32,
        address: &AddressRecord,
    ) -> Result<Address, DatabaseError>;
    async fn update_address(&self, id: i32, address: &AddressRecord) -> Result<u64, DatabaseError>;
    /// Deletes the address unless it is the last one of its client; 0 when nothing was removed
    async fn delete_address(&self, id: i32) -> Result<u64, DatabaseError>;

    // Orders
    async fn list_orders(&self, filter: &OrderFilter, page: Page) -> Result<Vec<Order>, DatabaseError>;
    async fn find_order(&self, id: i32) -> Result<Option<Order>, DatabaseError>;
    async fn create_order(&self, order: &NewOrder) -> Result<Order, DatabaseError>;
    async fn update_order(&self, id: i32, measures: &OrderMeasures) -> Result<u64, DatabaseError>;
    /// Removes the order's canceled deliveries, then the order
    async fn delete_order(&self, id: i32) -> Result<u64, DatabaseError>;

    // Deliveries
    async fn list_deliveries(
        &self,
        filter: &DeliveryFilter,
        page: Page,
    ) -> Result<Vec<Delivery>, DatabaseError>;
    async fn find_delivery(&self, id: i32) -> Result<Option<Delivery>, DatabaseError>;
    async fn deliveries_for_order(&self, order_id: i32) -> Result<Vec<Delivery>, DatabaseError>;
    async fn create_delivery(&self, delivery: &NewDelivery) -> Result<Delivery, DatabaseError>;
    async fn update_delivery_status(
        &self,
        id: i32,
        status: DeliveryStatus,
    ) -> Result<u64, DatabaseError>;
    async fn delete_delivery(&self, id: i32) -> Result<u64, DatabaseError>;
}
