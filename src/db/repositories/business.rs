use crate::entities::{
    attributes, business_categories, business_hours, businesses, categories, locations,
    prelude::*, search_queries, search_results,
};
use crate::models::business::{
    BusinessRecord, CategoryRecord, HoursEntry, LocationRecord, flatten_attributes,
};
use anyhow::Result;
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};
use serde_json::{Map, Value};
use std::collections::{HashMap, HashSet};
use tracing::{debug, info};

/// Result of [`BusinessRepository::insert`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    AlreadyExists,
}

/// Ids bound per `IN (...)` list, well under SQLite's variable limit.
const LOAD_CHUNK_SIZE: usize = 500;

pub struct BusinessRepository {
    conn: DatabaseConnection,
}

impl BusinessRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn exists(&self, business_id: &str) -> Result<bool> {
        let count = Businesses::find_by_id(business_id.to_string())
            .count(&self.conn)
            .await?;
        Ok(count > 0)
    }

    /// Inserts a business with its location, categories, hours and attributes
    /// in one transaction, linked to `query`.
    ///
    /// A business that is already stored is never touched. Unlike a plain
    /// no-op, the link to `query` is still recorded for it, so a later cache
    /// hit for `query` includes businesses first stored by another query.
    pub async fn insert(
        &self,
        record: &BusinessRecord,
        query: &search_queries::Model,
    ) -> Result<InsertOutcome> {
        if self.exists(&record.id).await? {
            info!("Business {} already exists, skipping", record.name);
            link_to_query(&self.conn, query.id, &record.id).await?;
            return Ok(InsertOutcome::AlreadyExists);
        }

        let txn = self.conn.begin().await?;
        let now = chrono::Utc::now().to_rfc3339();

        // A concurrent insert may have won since the check above.
        let inserted = Businesses::insert(businesses::ActiveModel {
            id: Set(record.id.clone()),
            alias: Set(record.alias.clone()),
            name: Set(record.name.clone()),
            image_url: Set(record.image_url.clone()),
            is_closed: Set(record.is_closed),
            url: Set(record.url.clone()),
            review_count: Set(record.review_count),
            rating: Set(record.rating),
            price: Set(record.price.clone()),
            phone: Set(record.phone.clone()),
            display_phone: Set(record.display_phone.clone()),
            distance: Set(record.distance),
            created_at: Set(now),
        })
        .on_conflict(
            OnConflict::column(businesses::Column::Id)
                .do_nothing()
                .to_owned(),
        )
        .exec_without_returning(&txn)
        .await?;

        if inserted == 0 {
            txn.rollback().await?;
            info!("Business {} already exists, skipping", record.name);
            link_to_query(&self.conn, query.id, &record.id).await?;
            return Ok(InsertOutcome::AlreadyExists);
        }

        link_to_query(&txn, query.id, &record.id).await?;

        let location = &record.location;
        Locations::insert(locations::ActiveModel {
            business_id: Set(record.id.clone()),
            address1: Set(location.address1.clone()),
            address2: Set(location.address2.clone()),
            address3: Set(location.address3.clone()),
            city: Set(location.city.clone()),
            state: Set(location.state.clone()),
            zip_code: Set(location.zip_code.clone()),
            country: Set(location.country.clone()),
            latitude: Set(location.latitude),
            longitude: Set(location.longitude),
            ..Default::default()
        })
        .exec(&txn)
        .await?;

        let mut seen = HashSet::new();
        for category in &record.categories {
            if !seen.insert(category.alias.as_str()) {
                continue;
            }
            let category_id = upsert_category(&txn, category).await?;
            BusinessCategories::insert(business_categories::ActiveModel {
                business_id: Set(record.id.clone()),
                category_id: Set(category_id),
                ..Default::default()
            })
            .exec(&txn)
            .await?;
        }

        if !record.business_hours.is_empty() {
            let hours: Vec<business_hours::ActiveModel> = record
                .business_hours
                .iter()
                .map(|h| business_hours::ActiveModel {
                    business_id: Set(record.id.clone()),
                    day: Set(h.day),
                    start_time: Set(h.start_time.clone()),
                    end_time: Set(h.end_time.clone()),
                    is_overnight: Set(h.is_overnight),
                    ..Default::default()
                })
                .collect();

            BusinessHours::insert_many(hours).exec(&txn).await?;
        }

        let flat = flatten_attributes(&record.attributes);
        if !flat.is_empty() {
            let attrs: Vec<attributes::ActiveModel> = flat
                .into_iter()
                .map(|(key, value)| attributes::ActiveModel {
                    business_id: Set(record.id.clone()),
                    key: Set(key),
                    value: Set(value),
                    ..Default::default()
                })
                .collect();

            Attributes::insert_many(attrs).exec(&txn).await?;
        }

        txn.commit().await?;
        debug!("Inserted business: {}", record.name);
        Ok(InsertOutcome::Inserted)
    }

    /// Every stored business, ordered by name.
    pub async fn all(&self) -> Result<Vec<BusinessRecord>> {
        let ids: Vec<String> = Businesses::find()
            .select_only()
            .column(businesses::Column::Id)
            .order_by_asc(businesses::Column::Name)
            .into_tuple()
            .all(&self.conn)
            .await?;

        self.load(&ids).await
    }

    /// Loads full records for `ids`, preserving their order. Unknown ids are
    /// skipped.
    pub async fn load(&self, ids: &[String]) -> Result<Vec<BusinessRecord>> {
        let mut rows: HashMap<String, businesses::Model> = HashMap::new();
        let mut locations: HashMap<String, locations::Model> = HashMap::new();
        let mut categories: HashMap<String, Vec<CategoryRecord>> = HashMap::new();
        let mut hours: HashMap<String, Vec<HoursEntry>> = HashMap::new();
        let mut attrs: HashMap<String, Map<String, Value>> = HashMap::new();

        for chunk in ids.chunks(LOAD_CHUNK_SIZE) {
            rows.extend(
                Businesses::find()
                    .filter(businesses::Column::Id.is_in(chunk.iter().cloned()))
                    .all(&self.conn)
                    .await?
                    .into_iter()
                    .map(|b| (b.id.clone(), b)),
            );

            locations.extend(
                Locations::find()
                    .filter(locations::Column::BusinessId.is_in(chunk.iter().cloned()))
                    .all(&self.conn)
                    .await?
                    .into_iter()
                    .map(|l| (l.business_id.clone(), l)),
            );

            for (link, category) in BusinessCategories::find()
                .filter(business_categories::Column::BusinessId.is_in(chunk.iter().cloned()))
                .order_by_asc(business_categories::Column::Id)
                .find_also_related(Categories)
                .all(&self.conn)
                .await?
            {
                if let Some(category) = category {
                    categories
                        .entry(link.business_id)
                        .or_default()
                        .push(CategoryRecord {
                            alias: category.alias,
                            title: category.title,
                        });
                }
            }

            for h in BusinessHours::find()
                .filter(business_hours::Column::BusinessId.is_in(chunk.iter().cloned()))
                .order_by_asc(business_hours::Column::Id)
                .all(&self.conn)
                .await?
            {
                hours.entry(h.business_id).or_default().push(HoursEntry {
                    day: h.day,
                    start_time: h.start_time,
                    end_time: h.end_time,
                    is_overnight: h.is_overnight,
                });
            }

            for a in Attributes::find()
                .filter(attributes::Column::BusinessId.is_in(chunk.iter().cloned()))
                .order_by_asc(attributes::Column::Id)
                .all(&self.conn)
                .await?
            {
                attrs
                    .entry(a.business_id)
                    .or_default()
                    .insert(a.key, a.value.map_or(Value::Null, Value::String));
            }
        }

        Ok(ids
            .iter()
            .filter_map(|id| {
                let b = rows.remove(id)?;
                let location = locations.remove(id).map(location_record).unwrap_or_default();
                Some(BusinessRecord {
                    categories: categories.remove(id).unwrap_or_default(),
                    business_hours: hours.remove(id).unwrap_or_default(),
                    attributes: attrs.remove(id).unwrap_or_default(),
                    location,
                    id: b.id,
                    alias: b.alias,
                    name: b.name,
                    image_url: b.image_url,
                    is_closed: b.is_closed,
                    url: b.url,
                    review_count: b.review_count,
                    rating: b.rating,
                    price: b.price,
                    phone: b.phone,
                    display_phone: b.display_phone,
                    distance: b.distance,
                })
            })
            .collect())
    }

    /// Deletes every row of every table, children first, in one transaction.
    pub async fn clear_all(&self) -> Result<()> {
        let txn = self.conn.begin().await?;

        Attributes::delete_many().exec(&txn).await?;
        BusinessHours::delete_many().exec(&txn).await?;
        BusinessCategories::delete_many().exec(&txn).await?;
        SearchResults::delete_many().exec(&txn).await?;
        Categories::delete_many().exec(&txn).await?;
        Locations::delete_many().exec(&txn).await?;
        Businesses::delete_many().exec(&txn).await?;
        SearchQueries::delete_many().exec(&txn).await?;

        txn.commit().await?;
        info!("All database records cleared successfully");
        Ok(())
    }
}

fn location_record(l: locations::Model) -> LocationRecord {
    LocationRecord {
        address1: l.address1,
        address2: l.address2,
        address3: l.address3,
        city: l.city,
        state: l.state,
        zip_code: l.zip_code,
        country: l.country,
        latitude: l.latitude,
        longitude: l.longitude,
    }
}

async fn link_to_query<C: ConnectionTrait>(
    conn: &C,
    search_query_id: i32,
    business_id: &str,
) -> Result<()> {
    SearchResults::insert(search_results::ActiveModel {
        search_query_id: Set(search_query_id),
        business_id: Set(business_id.to_string()),
        created_at: Set(chrono::Utc::now().to_rfc3339()),
        ..Default::default()
    })
    .on_conflict(
        OnConflict::columns([
            search_results::Column::SearchQueryId,
            search_results::Column::BusinessId,
        ])
        .do_nothing()
        .to_owned(),
    )
    .exec_without_returning(conn)
    .await?;
    Ok(())
}

/// Insert-if-absent on the unique alias, then read back the id. Safe against
/// concurrent inserts of the same new category.
async fn upsert_category<C: ConnectionTrait>(conn: &C, category: &CategoryRecord) -> Result<i32> {
    Categories::insert(categories::ActiveModel {
        alias: Set(category.alias.clone()),
        title: Set(category.title.clone()),
        ..Default::default()
    })
    .on_conflict(
        OnConflict::column(categories::Column::Alias)
            .do_nothing()
            .to_owned(),
    )
    .exec_without_returning(conn)
    .await?;

    let row = Categories::find()
        .filter(categories::Column::Alias.eq(category.alias.as_str()))
        .one(conn)
        .await?
        .ok_or_else(|| anyhow::anyhow!("Category '{}' missing after upsert", category.alias))?;

    Ok(row.id)
}
