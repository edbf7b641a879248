//! In-memory doubles for handler tests: a [`Repository`] backed by vectors
//! and a [`CepLookup`] that never touches the network.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde_json::Value;
use tower::ServiceExt;

use crate::app::app;
use crate::config::AppConfig;
use crate::database::models::{
    Address, AddressRecord, Client, ClientRecord, Delivery, DeliveryFilter, NewDelivery, NewOrder,
    Order, OrderFilter, OrderMeasures, Page, Phone,
};
use crate::database::{DatabaseError, Repository};
use crate::services::pricing::ChargeBreakdown;
use crate::services::{CepError, CepLookup, PostalAddress};
use crate::state::AppState;
use crate::types::DeliveryStatus;

/// CEP the stub reports as unknown
pub const UNKNOWN_CEP: &str = "00000000";
/// CEP for which the stub behaves as if the service were down
pub const UNAVAILABLE_CEP: &str = "99999999";
/// CEP the stub resolves without street or neighborhood
pub const GENERIC_CEP: &str = "13870000";

pub struct StubCep;

#[async_trait]
impl CepLookup for StubCep {
    async fn lookup(&self, cep: &str) -> Result<PostalAddress, CepError> {
        match cep {
            UNKNOWN_CEP => Err(CepError::NotFound(cep.to_string())),
            UNAVAILABLE_CEP => Err(CepError::Unavailable("stub offline".to_string())),
            GENERIC_CEP => Ok(PostalAddress {
                cep: cep.to_string(),
                estado: "SP".to_string(),
                cidade: "São João da Boa Vista".to_string(),
                bairro: String::new(),
                logradouro: String::new(),
            }),
            _ => Ok(PostalAddress {
                cep: cep.to_string(),
                estado: "SP".to_string(),
                cidade: "Sumaré".to_string(),
                bairro: "Centro".to_string(),
                logradouro: "Rua das Flores".to_string(),
            }),
        }
    }
}

#[derive(Default)]
struct Tables {
    clients: Vec<Client>,
    phones: Vec<Phone>,
    addresses: Vec<Address>,
    orders: Vec<Order>,
    deliveries: Vec<Delivery>,
    next_id: i32,
}

impl Tables {
    fn next_id(&mut self) -> i32 {
        self.next_id += 1;
        self.next_id
    }
}

fn window<T: Clone>(rows: Vec<T>, page: Page) -> Vec<T> {
    rows.into_iter()
        .skip(page.offset as usize)
        .take(page.limit as usize)
        .collect()
}

#[derive(Default)]
pub struct MemoryRepository {
    tables: Mutex<Tables>,
    down: bool,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every call fails as if the database could not be reached
    pub fn unreachable() -> Self {
        Self {
            down: true,
            ..Self::default()
        }
    }

    fn check(&self) -> Result<(), DatabaseError> {
        if self.down {
            Err(DatabaseError::ConnectionError("connection refused".to_string()))
        } else {
            Ok(())
        }
    }

    pub fn seed_client(&self, name: &str, cpf: &str, email: &str, birth_date: NaiveDate) -> Client {
        let mut t = self.tables.lock().unwrap();
        let client = Client {
            id: t.next_id(),
            name: name.to_string(),
            cpf: cpf.to_string(),
            email: email.to_string(),
            birth_date,
        };
        t.clients.push(client.clone());
        client
    }

    pub fn seed_phone(&self, client_id: i32, number: &str) -> Phone {
        let mut t = self.tables.lock().unwrap();
        let phone = Phone {
            id: t.next_id(),
            client_id,
            number: number.to_string(),
        };
        t.phones.push(phone.clone());
        phone
    }

    pub fn seed_address(&self, client_id: i32, cep: &str, number: &str) -> Address {
        let mut t = self.tables.lock().unwrap();
        let address = Address {
            id: t.next_id(),
            client_id,
            state: "SP".to_string(),
            city: "Sumaré".to_string(),
            neighborhood: "Centro".to_string(),
            street: "Rua das Flores".to_string(),
            number: number.to_string(),
            cep: cep.to_string(),
        };
        t.addresses.push(address.clone());
        address
    }

    pub fn seed_order(&self, client_id: i32, delivery_type_id: i32) -> Order {
        self.seed_order_with(
            client_id,
            delivery_type_id,
            OrderMeasures {
                distance: Decimal::new(10, 0),
                cargo_weight: Decimal::new(20, 0),
                rate_per_kg: Decimal::new(100, 2),
                rate_per_km: Decimal::new(250, 2),
            },
        )
    }

    pub fn seed_order_with(&self, client_id: i32, delivery_type_id: i32, measures: OrderMeasures) -> Order {
        let mut t = self.tables.lock().unwrap();
        let order = Order {
            id: t.next_id(),
            client_id,
            delivery_type_id,
            order_date: NaiveDate::from_ymd_opt(2024, 5, 10).unwrap(),
            distance: measures.distance,
            cargo_weight: measures.cargo_weight,
            rate_per_kg: measures.rate_per_kg,
            rate_per_km: measures.rate_per_km,
        };
        t.orders.push(order.clone());
        order
    }

    pub fn seed_delivery(&self, order_id: i32, status: DeliveryStatus) -> Delivery {
        let mut t = self.tables.lock().unwrap();
        let delivery = Delivery {
            id: t.next_id(),
            order_id,
            status,
            distance_value: Decimal::new(2500, 2),
            weight_value: Decimal::new(2000, 2),
            base_value: Decimal::new(4500, 2),
            surcharge: Decimal::ZERO,
            discount: Decimal::ZERO,
            extra_fee: Decimal::ZERO,
            final_value: Decimal::new(4500, 2),
        };
        t.deliveries.push(delivery.clone());
        delivery
    }

    pub fn clients(&self) -> Vec<Client> {
        self.tables.lock().unwrap().clients.clone()
    }

    pub fn phones(&self) -> Vec<Phone> {
        self.tables.lock().unwrap().phones.clone()
    }

    pub fn addresses(&self) -> Vec<Address> {
        self.tables.lock().unwrap().addresses.clone()
    }

    pub fn orders(&self) -> Vec<Order> {
        self.tables.lock().unwrap().orders.clone()
    }

    pub fn deliveries(&self) -> Vec<Delivery> {
        self.tables.lock().unwrap().deliveries.clone()
    }
}

fn delivery_from(id: i32, order_id: i32, status: DeliveryStatus, charges: &ChargeBreakdown) -> Delivery {
    Delivery {
        id,
        order_id,
        status,
        distance_value: charges.distance_value,
        weight_value: charges.weight_value,
        base_value: charges.base_value,
        surcharge: charges.surcharge,
        discount: charges.discount,
        extra_fee: charges.extra_fee,
        final_value: charges.final_value,
    }
}

#[async_trait]
impl Repository for MemoryRepository {
    async fn ping(&self) -> Result<(), DatabaseError> {
        self.check()
    }

    async fn list_clients(&self, page: Page) -> Result<Vec<Client>, DatabaseError> {
        self.check()?;
        Ok(window(self.clients(), page))
    }

    async fn find_client(&self, id: i32) -> Result<Option<Client>, DatabaseError> {
        self.check()?;
        Ok(self.clients().into_iter().find(|c| c.id == id))
    }

    async fn find_client_by_cpf(&self, cpf: &str) -> Result<Option<Client>, DatabaseError> {
        self.check()?;
        Ok(self.clients().into_iter().find(|c| c.cpf == cpf))
    }

    async fn find_client_by_email(&self, email: &str) -> Result<Option<Client>, DatabaseError> {
        self.check()?;
        Ok(self.clients().into_iter().find(|c| c.email == email))
    }

    async fn create_client(
        &self,
        client: &ClientRecord,
        phone: &str,
        address: &AddressRecord,
    ) -> Result<Client, DatabaseError> {
        self.check()?;
        let mut t = self.tables.lock().unwrap();
        if t.clients.iter().any(|c| c.cpf == client.cpf) {
            return Err(DatabaseError::UniqueViolation("clientes_cpf_key".into()));
        }
        let created = Client {
            id: t.next_id(),
            name: client.name.clone(),
            cpf: client.cpf.clone(),
            email: client.email.clone(),
            birth_date: client.birth_date,
        };
        let phone = Phone {
            id: t.next_id(),
            client_id: created.id,
            number: phone.to_string(),
        };
        let address = Address {
            id: t.next_id(),
            client_id: created.id,
            state: address.state.clone(),
            city: address.city.clone(),
            neighborhood: address.neighborhood.clone(),
            street: address.street.clone(),
            number: address.number.clone(),
            cep: address.cep.clone(),
        };
        t.clients.push(created.clone());
        t.phones.push(phone);
        t.addresses.push(address);
        Ok(created)
    }

    async fn update_client(&self, id: i32, client: &ClientRecord) -> Result<u64, DatabaseError> {
        self.check()?;
        let mut t = self.tables.lock().unwrap();
        match t.clients.iter_mut().find(|c| c.id == id) {
            Some(row) if ClientRecord::from(&*row) != *client => {
                row.name = client.name.clone();
                row.cpf = client.cpf.clone();
                row.email = client.email.clone();
                row.birth_date = client.birth_date;
                Ok(1)
            }
            _ => Ok(0),
        }
    }

    async fn delete_client(&self, id: i32) -> Result<u64, DatabaseError> {
        self.check()?;
        let mut t = self.tables.lock().unwrap();
        if t.orders.iter().any(|o| o.client_id == id) {
            return Err(DatabaseError::ForeignKeyViolation("pedidos_fk_id_cliente_fkey".into()));
        }
        t.phones.retain(|p| p.client_id != id);
        t.addresses.retain(|a| a.client_id != id);
        let before = t.clients.len();
        t.clients.retain(|c| c.id != id);
        Ok((before - t.clients.len()) as u64)
    }

    async fn count_orders_for_client(&self, id: i32) -> Result<i64, DatabaseError> {
        self.check()?;
        Ok(self.orders().iter().filter(|o| o.client_id == id).count() as i64)
    }

    async fn list_phones(&self, client_id: i32) -> Result<Vec<Phone>, DatabaseError> {
        self.check()?;
        Ok(self.phones().into_iter().filter(|p| p.client_id == client_id).collect())
    }

    async fn find_phone(&self, id: i32) -> Result<Option<Phone>, DatabaseError> {
        self.check()?;
        Ok(self.phones().into_iter().find(|p| p.id == id))
    }

    async fn find_phone_by_number(&self, number: &str) -> Result<Option<Phone>, DatabaseError> {
        self.check()?;
        Ok(self.phones().into_iter().find(|p| p.number == number))
    }

    async fn create_phone(&self, client_id: i32, number: &str) -> Result<Phone, DatabaseError> {
        self.check()?;
        Ok(self.seed_phone(client_id, number))
    }

    async fn update_phone(&self, id: i32, number: &str) -> Result<u64, DatabaseError> {
        self.check()?;
        let mut t = self.tables.lock().unwrap();
        match t.phones.iter_mut().find(|p| p.id == id) {
            Some(row) if row.number != number => {
                row.number = number.to_string();
                Ok(1)
            }
            _ => Ok(0),
        }
    }

    async fn delete_phone(&self, id: i32) -> Result<u64, DatabaseError> {
        self.check()?;
        let mut t = self.tables.lock().unwrap();
        let Some(owner) = t.phones.iter().find(|p| p.id == id).map(|p| p.client_id) else {
            return Ok(0);
        };
        if t.phones.iter().filter(|p| p.client_id == owner).count() <= 1 {
            return Ok(0);
        }
        t.phones.retain(|p| p.id != id);
        Ok(1)
    }

    async fn list_addresses(&self, client_id: i32) -> Result<Vec<Address>, DatabaseError> {
        self.check()?;
        Ok(self.addresses().into_iter().filter(|a| a.client_id == client_id).collect())
    }

    async fn find_address(&self, id: i32) -> Result<Option<Address>, DatabaseError> {
        self.check()?;
        Ok(self.addresses().into_iter().find(|a| a.id == id))
    }

    async fn find_client_address(
        &self,
        client_id: i32,
        cep: &str,
        number: &str,
    ) -> Result<Option<Address>, DatabaseError> {
        self.check()?;
        Ok(self
            .addresses()
            .into_iter()
            .find(|a| a.client_id == client_id && a.cep == cep && a.number == number))
    }

    async fn create_address(
        &self,
        client_id: i32,
        address: &AddressRecord,
    ) -> Result<Address, DatabaseError> {
        self.check()?;
        let mut t = self.tables.lock().unwrap();
        let created = Address {
            id: t.next_id(),
            client_id,
            state: address.state.clone(),
            city: address.city.clone(),
            neighborhood: address.neighborhood.clone(),
            street: address.street.clone(),
            number: address.number.clone(),
            cep: address.cep.clone(),
        };
        t.addresses.push(created.clone());
        Ok(created)
    }

    async fn update_address(&self, id: i32, address: &AddressRecord) -> Result<u64, DatabaseError> {
        self.check()?;
        let mut t = self.tables.lock().unwrap();
        match t.addresses.iter_mut().find(|a| a.id == id) {
            Some(row) if AddressRecord::from(&*row) != *address => {
                row.state = address.state.clone();
                row.city = address.city.clone();
                row.neighborhood = address.neighborhood.clone();
                row.street = address.street.clone();
                row.number = address.number.clone();
                row.cep = address.cep.clone();
                Ok(1)
            }
            _ => Ok(0),
        }
    }

    async fn delete_address(&self, id: i32) -> Result<u64, DatabaseError> {
        self.check()?;
        let mut t = self.tables.lock().unwrap();
        let Some(owner) = t.addresses.iter().find(|a| a.id == id).map(|a| a.client_id) else {
            return Ok(0);
        };
        if t.addresses.iter().filter(|a| a.client_id == owner).count() <= 1 {
            return Ok(0);
        }
        t.addresses.retain(|a| a.id != id);
        Ok(1)
    }

    async fn list_orders(&self, filter: &OrderFilter, page: Page) -> Result<Vec<Order>, DatabaseError> {
        self.check()?;
        let rows = self
            .orders()
            .into_iter()
            .filter(|o| filter.order_id.map_or(true, |id| o.id == id))
            .filter(|o| filter.client_id.map_or(true, |id| o.client_id == id))
            .filter(|o| filter.delivery_type_id.map_or(true, |id| o.delivery_type_id == id))
            .collect();
        Ok(window(rows, page))
    }

    async fn find_order(&self, id: i32) -> Result<Option<Order>, DatabaseError> {
        self.check()?;
        Ok(self.orders().into_iter().find(|o| o.id == id))
    }

    async fn create_order(&self, order: &NewOrder) -> Result<Order, DatabaseError> {
        self.check()?;
        let mut t = self.tables.lock().unwrap();
        let created = Order {
            id: t.next_id(),
            client_id: order.client_id,
            delivery_type_id: order.delivery_type_id,
            order_date: order.order_date,
            distance: order.measures.distance,
            cargo_weight: order.measures.cargo_weight,
            rate_per_kg: order.measures.rate_per_kg,
            rate_per_km: order.measures.rate_per_km,
        };
        t.orders.push(created.clone());
        Ok(created)
    }

    async fn update_order(&self, id: i32, measures: &OrderMeasures) -> Result<u64, DatabaseError> {
        self.check()?;
        let mut t = self.tables.lock().unwrap();
        match t.orders.iter_mut().find(|o| o.id == id) {
            Some(row) if OrderMeasures::from(&*row) != *measures => {
                row.distance = measures.distance;
                row.cargo_weight = measures.cargo_weight;
                row.rate_per_kg = measures.rate_per_kg;
                row.rate_per_km = measures.rate_per_km;
                Ok(1)
            }
            _ => Ok(0),
        }
    }

    async fn delete_order(&self, id: i32) -> Result<u64, DatabaseError> {
        self.check()?;
        let mut t = self.tables.lock().unwrap();
        t.deliveries
            .retain(|d| !(d.order_id == id && d.status == DeliveryStatus::Canceled));
        if t.deliveries.iter().any(|d| d.order_id == id) {
            return Err(DatabaseError::ForeignKeyViolation("entregas_fk_id_pedido_fkey".into()));
        }
        let before = t.orders.len();
        t.orders.retain(|o| o.id != id);
        Ok((before - t.orders.len()) as u64)
    }

    async fn list_deliveries(
        &self,
        filter: &DeliveryFilter,
        page: Page,
    ) -> Result<Vec<Delivery>, DatabaseError> {
        self.check()?;
        let rows = self
            .deliveries()
            .into_iter()
            .filter(|d| filter.delivery_id.map_or(true, |id| d.id == id))
            .filter(|d| filter.order_id.map_or(true, |id| d.order_id == id))
            .filter(|d| filter.status.map_or(true, |s| d.status == s))
            .collect();
        Ok(window(rows, page))
    }

    async fn find_delivery(&self, id: i32) -> Result<Option<Delivery>, DatabaseError> {
        self.check()?;
        Ok(self.deliveries().into_iter().find(|d| d.id == id))
    }

    async fn deliveries_for_order(&self, order_id: i32) -> Result<Vec<Delivery>, DatabaseError> {
        self.check()?;
        Ok(self.deliveries().into_iter().filter(|d| d.order_id == order_id).collect())
    }

    async fn create_delivery(&self, delivery: &NewDelivery) -> Result<Delivery, DatabaseError> {
        self.check()?;
        let mut t = self.tables.lock().unwrap();
        if t.deliveries
            .iter()
            .any(|d| d.order_id == delivery.order_id && d.status != DeliveryStatus::Canceled)
        {
            return Err(DatabaseError::UniqueViolation("entregas_pedido_ativo_idx".into()));
        }
        let id = t.next_id();
        let created = delivery_from(id, delivery.order_id, delivery.status, &delivery.charges);
        t.deliveries.push(created.clone());
        Ok(created)
    }

    async fn update_delivery_status(
        &self,
        id: i32,
        status: DeliveryStatus,
    ) -> Result<u64, DatabaseError> {
        self.check()?;
        let mut t = self.tables.lock().unwrap();
        match t.deliveries.iter_mut().find(|d| d.id == id) {
            Some(row) if row.status != status => {
                row.status = status;
                Ok(1)
            }
            _ => Ok(0),
        }
    }

    async fn delete_delivery(&self, id: i32) -> Result<u64, DatabaseError> {
        self.check()?;
        let mut t = self.tables.lock().unwrap();
        let before = t.deliveries.len();
        t.deliveries.retain(|d| d.id != id);
        Ok((before - t.deliveries.len()) as u64)
    }
}

/// Router wired to a [`MemoryRepository`] and [`StubCep`]
pub struct TestApp {
    pub repo: Arc<MemoryRepository>,
    router: Router,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_repository(MemoryRepository::new())
    }

    pub fn with_repository(repo: MemoryRepository) -> Self {
        let repo = Arc::new(repo);
        let mut config = AppConfig::development();
        config.api.enable_request_logging = false;
        let state = AppState::new(repo.clone(), Arc::new(StubCep), config);
        Self {
            repo,
            router: app(state),
        }
    }

    /// Send one request and return the status with the parsed JSON body
    pub async fn send(&self, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(serde_json::to_vec(&json).unwrap()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.send("GET", uri, None).await
    }

    pub async fn post(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.send("POST", uri, Some(body)).await
    }

    pub async fn put(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.send("PUT", uri, Some(body)).await
    }

    pub async fn delete(&self, uri: &str) -> (StatusCode, Value) {
        self.send("DELETE", uri, None).await
    }

    /// An adult client with one phone and one address
    pub fn seed_client(&self) -> Client {
        let client = self.repo.seed_client(
            "Ana Souza",
            "52998224725",
            "ana@example.com",
            NaiveDate::from_ymd_opt(1990, 3, 12).unwrap(),
        );
        self.repo.seed_phone(client.id, "19999998888");
        self.repo.seed_address(client.id, "13170023", "100");
        client
    }
}
