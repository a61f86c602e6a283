use chrono::Utc;
use rust_decimal::Decimal;
use serde_json::Value;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::{fetch_page, Actor, ListParams, Listing};
use crate::error::{AppError, DetailCode, Details, ErrorCode};
use crate::mapper;
use crate::repository::{Entity, RepositoryError, RepositoryErrorKind};
use crate::uow::UnitOfWork;
use crate::validation::FieldErrors;

use super::model::{Product, ProductFilter};
use super::payload::{CreateProductRequest, ProductResponse, UpdateProductRequest, PRICE_RULES};

const NAME_UNIQUE: &str = "products_name_unique";
const UID_UNIQUE: &str = "ux_products_uid_active";

#[derive(Debug, Clone)]
pub struct ProductService {
    pool: PgPool,
}

impl ProductService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn uow(&self) -> UnitOfWork {
        UnitOfWork::new(self.pool.clone())
    }

    #[tracing::instrument(name = "product.create", skip_all, fields(actor = actor.id))]
    pub async fn create(
        &self,
        actor: &Actor,
        request: CreateProductRequest,
    ) -> Result<ProductResponse, AppError> {
        let mut product = Product::default();
        mapper::to_model(&request, &mut product)?;

        product.price = parse_price(request.price.as_deref().unwrap_or_default())?;
        product.uid = Uuid::new_v4();
        product.created_on = Utc::now();
        product.created_by = actor.to_json();

        let created = self
            .uow()
            .products()
            .save(&product)
            .await
            .map_err(translate)?;

        tracing::info!(id = created.id, "product created");
        Ok(mapper::map(&created)?)
    }

    #[tracing::instrument(name = "product.list", skip_all)]
    pub async fn list(
        &self,
        params: &ListParams,
        filter: &ProductFilter,
    ) -> Result<Listing<ProductResponse>, AppError> {
        let (page, sort) = params.resolve(Product::SORTABLE)?;

        let uow = self.uow();
        let repo = uow.products();
        let (total, rows) = fetch_page(
            repo.count(Some(filter)),
            repo.find_all(Some(filter), Some(page), Some(&sort)),
        )
        .await
        .map_err(translate)?;

        Ok(Listing::new(mapper::map_all(&rows)?, page, total))
    }

    #[tracing::instrument(name = "product.get", skip(self))]
    pub async fn get(&self, id: i64) -> Result<ProductResponse, AppError> {
        let product = self
            .uow()
            .products()
            .find_by_id(id)
            .await
            .map_err(translate)?;
        Ok(mapper::map(&product)?)
    }

    /// Merge the set fields of `request` into the stored row
    #[tracing::instrument(name = "product.update", skip(self, actor, request), fields(actor = actor.id))]
    pub async fn update(
        &self,
        actor: &Actor,
        id: i64,
        request: UpdateProductRequest,
    ) -> Result<ProductResponse, AppError> {
        let price = request.price.as_deref().map(parse_price).transpose()?;

        let tx = self.uow().begin().await.map_err(translate)?;
        let result = apply_update(&tx, id, request, price, actor.to_json()).await;
        let updated = tx.finish(result).await?;

        Ok(mapper::map(&updated)?)
    }

    #[tracing::instrument(name = "product.delete", skip(self))]
    pub async fn delete(&self, id: i64) -> Result<(), AppError> {
        let tx = self.uow().begin().await.map_err(translate)?;
        let result = remove(&tx, id).await;
        tx.finish(result).await
    }
}

async fn apply_update(
    tx: &UnitOfWork,
    id: i64,
    request: UpdateProductRequest,
    price: Option<Decimal>,
    modified_by: Value,
) -> Result<Product, AppError> {
    let mut product = tx.products().find_by_id(id).await.map_err(translate)?;

    mapper::to_model(&request, &mut product)?;
    if let Some(price) = price {
        product.price = price;
    }
    product.modified_on = Some(Utc::now());
    product.modified_by = Some(modified_by);

    tx.products().update(&product).await.map_err(translate)
}

async fn remove(tx: &UnitOfWork, id: i64) -> Result<(), AppError> {
    tx.products().find_by_id(id).await.map_err(translate)?;
    tx.products().delete(id).await.map_err(translate)?;
    Ok(())
}

/// Parse a price that the `price` column can store exactly
fn parse_price(raw: &str) -> Result<Decimal, AppError> {
    let mut errors = FieldErrors::new();
    errors.check("price", Some(raw), PRICE_RULES);
    errors.finish()?;

    raw.trim().parse::<Decimal>().map_err(|_| {
        AppError::validation(Details::new()).with_detail("price", DetailCode::InvalidFormat.as_str())
    })
}

/// Storage error to product error
fn translate(err: RepositoryError) -> AppError {
    match err.kind {
        RepositoryErrorKind::NotFound => {
            AppError::not_found(ErrorCode::ProductNotFound, "product not found").with_source(err)
        }
        RepositoryErrorKind::UniqueViolation => {
            let (code, message) = match err.constraint() {
                Some(NAME_UNIQUE) => (ErrorCode::ProductNameExists, "product name already exists"),
                Some(UID_UNIQUE) => (ErrorCode::DuplicateEntry, "product UID already exists"),
                _ => (ErrorCode::DuplicateEntry, "unique constraint violated"),
            };
            let error = AppError::new(code, message);
            let error = match err.unique.as_ref().map(|u| u.details()) {
                Some(details) if !details.is_empty() => error.with_details(details),
                _ => error,
            };
            error.with_source(err)
        }
        _ => AppError::from(err),
    }
}
