use async_trait::async_trait;
use sqlx::PgPool;
use tracing::debug;

use crate::database::manager::{DatabaseError, DatabaseManager};
use crate::database::models::{
    Address, AddressRecord, Client, ClientRecord, Delivery, DeliveryFilter, NewDelivery, NewOrder,
    Order, OrderFilter, OrderMeasures, Page, Phone,
};
use crate::database::repository::Repository;
use crate::types::DeliveryStatus;

const CLIENT_COLUMNS: &str = "id_cliente, nome_cliente, cpf_cliente, email_cliente, data_nasc";
const PHONE_COLUMNS: &str = "id_telefone, fk_id_cliente, telefone";
const ADDRESS_COLUMNS: &str =
    "id_endereco, fk_id_cliente, estado, cidade, bairro, logradouro, numero, cep";
const ORDER_COLUMNS: &str = "id_pedido, fk_id_cliente, fk_id_tipo_entrega, data_pedido, \
     distancia, peso_carga, valor_base_kg, valor_base_km";
const DELIVERY_COLUMNS: &str = "id_entrega, fk_id_pedido, fk_id_status_entrega, \
     valor_distancia, valor_peso, valor_base, acrescimo, desconto, taxa_extra, valor_final";

/// PostgreSQL-backed [`Repository`]
#[derive(Clone)]
pub struct PgRepository {
    pool: PgPool,
}

impl PgRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Repository for PgRepository {
    async fn ping(&self) -> Result<(), DatabaseError> {
        DatabaseManager::health_check(&self.pool).await
    }

    async fn list_clients(&self, page: Page) -> Result<Vec<Client>, DatabaseError> {
        let sql = format!(
            "SELECT {} FROM clientes ORDER BY id_cliente LIMIT $1 OFFSET $2",
            CLIENT_COLUMNS
        );
        let rows = sqlx::query_as(&sql)
            .bind(page.limit)
            .bind(page.offset)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn find_client(&self, id: i32) -> Result<Option<Client>, DatabaseError> {
        let sql = format!("SELECT {} FROM clientes WHERE id_cliente = $1", CLIENT_COLUMNS);
        Ok(sqlx::query_as(&sql).bind(id).fetch_optional(&self.pool).await?)
    }

    async fn find_client_by_cpf(&self, cpf: &str) -> Result<Option<Client>, DatabaseError> {
        let sql = format!("SELECT {} FROM clientes WHERE cpf_cliente = $1", CLIENT_COLUMNS);
        Ok(sqlx::query_as(&sql).bind(cpf).fetch_optional(&self.pool).await?)
    }

    async fn find_client_by_email(&self, email: &str) -> Result<Option<Client>, DatabaseError> {
        let sql = format!("SELECT {} FROM clientes WHERE email_cliente = $1", CLIENT_COLUMNS);
        Ok(sqlx::query_as(&sql).bind(email).fetch_optional(&self.pool).await?)
    }

    async fn create_client(
        &self,
        client: &ClientRecord,
        phone: &str,
        address: &AddressRecord,
    ) -> Result<Client, DatabaseError> {
        let mut tx = self.pool.begin().await?;

        let sql = format!(
            "INSERT INTO clientes (nome_cliente, cpf_cliente, email_cliente, data_nasc) \
             VALUES ($1, $2, $3, $4) RETURNING {}",
            CLIENT_COLUMNS
        );
        let created: Client = sqlx::query_as(&sql)
            .bind(&client.name)
            .bind(&client.cpf)
            .bind(&client.email)
            .bind(client.birth_date)
            .fetch_one(&mut *tx)
            .await?;

        sqlx::query("INSERT INTO telefones (fk_id_cliente, telefone) VALUES ($1, $2)")
            .bind(created.id)
            .bind(phone)
            .execute(&mut *tx)
            .await?;

        sqlx::query(
            "INSERT INTO enderecos (fk_id_cliente, estado, cidade, bairro, logradouro, numero, cep) \
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(created.id)
        .bind(&address.state)
        .bind(&address.city)
        .bind(&address.neighborhood)
        .bind(&address.street)
        .bind(&address.number)
        .bind(&address.cep)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        debug!("Inserted client {} with phone and address", created.id);
        Ok(created)
    }

    async fn update_client(&self, id: i32, client: &ClientRecord) -> Result<u64, DatabaseError> {
        let result = sqlx::query(
            "UPDATE clientes SET nome_cliente = $2, cpf_cliente = $3, email_cliente = $4, data_nasc = $5 \
             WHERE id_cliente = $1 AND (nome_cliente IS DISTINCT FROM $2 \
                OR cpf_cliente IS DISTINCT FROM $3 \
                OR email_cliente IS DISTINCT FROM $4 \
                OR data_nasc IS DISTINCT FROM $5)",
        )
        .bind(id)
        .bind(&client.name)
        .bind(&client.cpf)
        .bind(&client.email)
        .bind(client.birth_date)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    async fn delete_client(&self, id: i32) -> Result<u64, DatabaseError> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM telefones WHERE fk_id_cliente = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM enderecos WHERE fk_id_cliente = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        let result = sqlx::query("DELETE FROM clientes WHERE id_cliente = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(result.rows_affected())
    }

    async fn count_orders_for_client(&self, id: i32) -> Result<i64, DatabaseError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM pedidos WHERE fk_id_cliente = $1")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn list_phones(&self, client_id: i32) -> Result<Vec<Phone>, DatabaseError> {
        let sql = format!(
            "SELECT {} FROM telefones WHERE fk_id_cliente = $1 ORDER BY id_telefone",
            PHONE_COLUMNS
        );
        Ok(sqlx::query_as(&sql).bind(client_id).fetch_all(&self.pool).await?)
    }

    async fn find_phone(&self, id: i32) -> Result<Option<Phone>, DatabaseError> {
        let sql = format!("SELECT {} FROM telefones WHERE id_telefone = $1", PHONE_COLUMNS);
        Ok(sqlx::query_as(&sql).bind(id).fetch_optional(&self.pool).await?)
    }

    async fn find_phone_by_number(&self, number: &str) -> Result<Option<Phone>, DatabaseError> {
        let sql = format!("SELECT {} FROM telefones WHERE telefone = $1", PHONE_COLUMNS);
        Ok(sqlx::query_as(&sql).bind(number).fetch_optional(&self.pool).await?)
    }

    async fn create_phone(&self, client_id: i32, number: &str) -> Result<Phone, DatabaseError> {
        let sql = format!(
            "INSERT INTO telefones (fk_id_cliente, telefone) VALUES ($1, $2) RETURNING {}",
            PHONE_COLUMNS
        );
        Ok(sqlx::query_as(&sql)
            .bind(client_id)
            .bind(number)
            .fetch_one(&self.pool)
            .await?)
    }

    async fn update_phone(&self, id: i32, number: &str) -> Result<u64, DatabaseError> {
        let result = sqlx::query(
            "UPDATE telefones SET telefone = $2 WHERE id_telefone = $1 AND telefone IS DISTINCT FROM $2",
        )
        .bind(id)
        .bind(number)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    async fn delete_phone(&self, id: i32) -> Result<u64, DatabaseError> {
        let mut tx = self.pool.begin().await?;
        // Lock the owner so concurrent deletes for one client serialize
        let owner: Option<i32> = sqlx::query_scalar(
            "SELECT c.id_cliente FROM clientes c \
             JOIN telefones t ON t.fk_id_cliente = c.id_cliente \
             WHERE t.id_telefone = $1 FOR UPDATE OF c",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;
        let Some(client_id) = owner else {
            return Ok(0);
        };

        let remaining: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM telefones WHERE fk_id_cliente = $1")
            .bind(client_id)
            .fetch_one(&mut *tx)
            .await?;
        if remaining <= 1 {
            return Ok(0);
        }

        let result = sqlx::query("DELETE FROM telefones WHERE id_telefone = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(result.rows_affected())
    }

    async fn list_addresses(&self, client_id: i32) -> Result<Vec<Address>, DatabaseError> {
        let sql = format!(
            "SELECT {} FROM enderecos WHERE fk_id_cliente = $1 ORDER BY id_endereco",
            ADDRESS_COLUMNS
        );
        Ok(sqlx::query_as(&sql).bind(client_id).fetch_all(&self.pool).await?)
    }

    async fn find_address(&self, id: i32) -> Result<Option<Address>, DatabaseError> {
        let sql = format!("SELECT {} FROM enderecos WHERE id_endereco = $1", ADDRESS_COLUMNS);
        Ok(sqlx::query_as(&sql).bind(id).fetch_optional(&self.pool).await?)
    }

    async fn find_client_address(
        &self,
        client_id: i32,
        cep: &str,
        number: &str,
    ) -> Result<Option<Address>, DatabaseError> {
        let sql = format!(
            "SELECT {} FROM enderecos WHERE fk_id_cliente = $1 AND cep = $2 AND numero = $3",
            ADDRESS_COLUMNS
        );
        Ok(sqlx::query_as(&sql)
            .bind(client_id)
            .bind(cep)
            .bind(number)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn create_address(
        &self,
        client_id: i32,
        address: &AddressRecord,
    ) -> Result<Address, DatabaseError> {
        let sql = format!(
            "INSERT INTO enderecos (fk_id_cliente, estado, cidade, bairro, logradouro, numero, cep) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING {}",
            ADDRESS_COLUMNS
        );
        Ok(sqlx::query_as(&sql)
            .bind(client_id)
            .bind(&address.state)
            .bind(&address.city)
            .bind(&address.neighborhood)
            .bind(&address.street)
            .bind(&address.number)
            .bind(&address.cep)
            .fetch_one(&self.pool)
            .await?)
    }

    async fn update_address(&self, id: i32, address: &AddressRecord) -> Result<u64, DatabaseError> {
        let result = sqlx::query(
            "UPDATE enderecos SET estado = $2, cidade = $3, bairro = $4, logradouro = $5, numero = $6, cep = $7 \
             WHERE id_endereco = $1 AND (estado IS DISTINCT FROM $2 \
                OR cidade IS DISTINCT FROM $3 \
                OR bairro IS DISTINCT FROM $4 \
                OR logradouro IS DISTINCT FROM $5 \
                OR numero IS DISTINCT FROM $6 \
                OR cep IS DISTINCT FROM $7)",
        )
        .bind(id)
        .bind(&address.state)
        .bind(&address.city)
        .bind(&address.neighborhood)
        .bind(&address.street)
        .bind(&address.number)
        .bind(&address.cep)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    async fn delete_address(&self, id: i32) -> Result<u64, DatabaseError> {
        let mut tx = self.pool.begin().await?;
        let owner: Option<i32> = sqlx::query_scalar(
            "SELECT c.id_cliente FROM clientes c \
             JOIN enderecos e ON e.fk_id_cliente = c.id_cliente \
             WHERE e.id_endereco = $1 FOR UPDATE OF c",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;
        let Some(client_id) = owner else {
            return Ok(0);
        };

        let remaining: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM enderecos WHERE fk_id_cliente = $1")
            .bind(client_id)
            .fetch_one(&mut *tx)
            .await?;
        if remaining <= 1 {
            return Ok(0);
        }

        let result = sqlx::query("DELETE FROM enderecos WHERE id_endereco = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(result.rows_affected())
    }

    async fn list_orders(&self, filter: &OrderFilter, page: Page) -> Result<Vec<Order>, DatabaseError> {
        let sql = format!(
            "SELECT {} FROM pedidos \
             WHERE ($1::INTEGER IS NULL OR id_pedido = $1) \
               AND ($2::INTEGER IS NULL OR fk_id_cliente = $2) \
               AND ($3::INTEGER IS NULL OR fk_id_tipo_entrega = $3) \
             ORDER BY id_pedido LIMIT $4 OFFSET $5",
            ORDER_COLUMNS
        );
        Ok(sqlx::query_as(&sql)
            .bind(filter.order_id)
            .bind(filter.client_id)
            .bind(filter.delivery_type_id)
            .bind(page.limit)
            .bind(page.offset)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn find_order(&self, id: i32) -> Result<Option<Order>, DatabaseError> {
        let sql = format!("SELECT {} FROM pedidos WHERE id_pedido = $1", ORDER_COLUMNS);
        Ok(sqlx::query_as(&sql).bind(id).fetch_optional(&self.pool).await?)
    }

    async fn create_order(&self, order: &NewOrder) -> Result<Order, DatabaseError> {
        let sql = format!(
            "INSERT INTO pedidos (fk_id_cliente, fk_id_tipo_entrega, data_pedido, distancia, \
             peso_carga, valor_base_kg, valor_base_km) VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING {}",
            ORDER_COLUMNS
        );
        Ok(sqlx::query_as(&sql)
            .bind(order.client_id)
            .bind(order.delivery_type_id)
            .bind(order.order_date)
            .bind(order.measures.distance)
            .bind(order.measures.cargo_weight)
            .bind(order.measures.rate_per_kg)
            .bind(order.measures.rate_per_km)
            .fetch_one(&self.pool)
            .await?)
    }

    async fn update_order(&self, id: i32, measures: &OrderMeasures) -> Result<u64, DatabaseError> {
        let result = sqlx::query(
            "UPDATE pedidos SET distancia = $2, peso_carga = $3, valor_base_kg = $4, valor_base_km = $5 \
             WHERE id_pedido = $1 AND (distancia IS DISTINCT FROM $2 \
                OR peso_carga IS DISTINCT FROM $3 \
                OR valor_base_kg IS DISTINCT FROM $4 \
                OR valor_base_km IS DISTINCT FROM $5)",
        )
        .bind(id)
        .bind(measures.distance)
        .bind(measures.cargo_weight)
        .bind(measures.rate_per_kg)
        .bind(measures.rate_per_km)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    async fn delete_order(&self, id: i32) -> Result<u64, DatabaseError> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM entregas WHERE fk_id_pedido = $1 AND fk_id_status_entrega = $2")
            .bind(id)
            .bind(DeliveryStatus::Canceled.code())
            .execute(&mut *tx)
            .await?;
        let result = sqlx::query("DELETE FROM pedidos WHERE id_pedido = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(result.rows_affected())
    }

    async fn list_deliveries(
        &self,
        filter: &DeliveryFilter,
        page: Page,
    ) -> Result<Vec<Delivery>, DatabaseError> {
        let sql = format!(
            "SELECT {} FROM entregas \
             WHERE ($1::INTEGER IS NULL OR id_entrega = $1) \
               AND ($2::INTEGER IS NULL OR fk_id_pedido = $2) \
               AND ($3::INTEGER IS NULL OR fk_id_status_entrega = $3) \
             ORDER BY id_entrega LIMIT $4 OFFSET $5",
            DELIVERY_COLUMNS
        );
        Ok(sqlx::query_as(&sql)
            .bind(filter.delivery_id)
            .bind(filter.order_id)
            .bind(filter.status.map(DeliveryStatus::code))
            .bind(page.limit)
            .bind(page.offset)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn find_delivery(&self, id: i32) -> Result<Option<Delivery>, DatabaseError> {
        let sql = format!("SELECT {} FROM entregas WHERE id_entrega = $1", DELIVERY_COLUMNS);
        Ok(sqlx::query_as(&sql).bind(id).fetch_optional(&self.pool).await?)
    }

    async fn deliveries_for_order(&self, order_id: i32) -> Result<Vec<Delivery>, DatabaseError> {
        let sql = format!(
            "SELECT {} FROM entregas WHERE fk_id_pedido = $1 ORDER BY id_entrega",
            DELIVERY_COLUMNS
        );
        Ok(sqlx::query_as(&sql).bind(order_id).fetch_all(&self.pool).await?)
    }

    async fn create_delivery(&self, delivery: &NewDelivery) -> Result<Delivery, DatabaseError> {
        let sql = format!(
            "INSERT INTO entregas (fk_id_pedido, fk_id_status_entrega, valor_distancia, valor_peso, \
             valor_base, acrescimo, desconto, taxa_extra, valor_final) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) RETURNING {}",
            DELIVERY_COLUMNS
        );
        let charges = &delivery.charges;
        Ok(sqlx::query_as(&sql)
            .bind(delivery.order_id)
            .bind(delivery.status.code())
            .bind(charges.distance_value)
            .bind(charges.weight_value)
            .bind(charges.base_value)
            .bind(charges.surcharge)
            .bind(charges.discount)
            .bind(charges.extra_fee)
            .bind(charges.final_value)
            .fetch_one(&self.pool)
            .await?)
    }

    async fn update_delivery_status(
        &self,
        id: i32,
        status: DeliveryStatus,
    ) -> Result<u64, DatabaseError> {
        let result = sqlx::query(
            "UPDATE entregas SET fk_id_status_entrega = $2 \
             WHERE id_entrega = $1 AND fk_id_status_entrega IS DISTINCT FROM $2",
        )
        .bind(id)
        .bind(status.code())
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    async fn delete_delivery(&self, id: i32) -> Result<u64, DatabaseError> {
        let result = sqlx::query("DELETE FROM entregas WHERE id_entrega = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
