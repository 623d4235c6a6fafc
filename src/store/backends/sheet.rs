//! Google spreadsheet backend.
//!
//! The worksheet has a header row with `Code`, `BuyDate`, `Qty` and `Price`
//! columns and one row per held code. The watchlist is the set of codes; the
//! other columns are position metadata that survives full-set saves for
//! codes that stay on the list.
//!
//! Every mutation reads the table, edits it and writes the whole table back
//! starting at `A1`, then blanks any rows left over below it.

use crate::core::{now, Error, Result, StockCode, Watchlist};
use crate::store::backend::{StoreType, WatchlistStore};
use crate::store::config::SheetConfig;
use crate::store::google::SheetsClient;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// Date format of the `BuyDate` column.
pub const DATE_FORMAT: &str = "%Y-%m-%d";
/// Header written to row 1.
pub const COLUMNS: [&str; 4] = ["Code", "BuyDate", "Qty", "Price"];

/// One sheet row.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SheetRow {
    /// Stock code as written in the sheet
    #[serde(rename = "Code")]
    pub code: String,
    /// Purchase date
    #[serde(rename = "BuyDate", default)]
    pub buy_date: String,
    /// Quantity held
    #[serde(rename = "Qty", default)]
    pub qty: String,
    /// Purchase price
    #[serde(rename = "Price", default)]
    pub price: String,
}

impl SheetRow {
    /// Create a row with today's date, zero quantity and zero price.
    pub fn new(code: &StockCode) -> Self {
        Self {
            code: code.to_string(),
            buy_date: today(),
            qty: "0".to_string(),
            price: "0.0".to_string(),
        }
    }

    /// Set the purchase date.
    pub fn with_date(mut self, date: &str) -> Self {
        self.buy_date = date.to_string();
        self
    }

    /// Set the quantity.
    pub fn with_qty(mut self, qty: u64) -> Self {
        self.qty = qty.to_string();
        self
    }

    /// Set the price.
    pub fn with_price(mut self, price: f64) -> Self {
        self.price = format!("{:?}", price);
        self
    }

    /// The row's code, if it is a valid stock code.
    pub fn stock_code(&self) -> Option<StockCode> {
        StockCode::parse(self.code.trim()).ok()
    }

    fn to_values(&self) -> Vec<String> {
        vec![
            self.code.clone(),
            self.buy_date.clone(),
            self.qty.clone(),
            self.price.clone(),
        ]
    }
}

fn today() -> String {
    now().format(DATE_FORMAT).to_string()
}

/// Result of a row upsert.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Upsert {
    /// A new row was appended
    Added,
    /// An existing row was overwritten
    Updated,
}

/// Parse worksheet values into rows.
///
/// Columns are located by header: the code column is the first header
/// containing `Code`, the others match exactly. Rows with a blank code are
/// skipped; blank metadata cells get the same defaults as a new row.
pub fn rows_from_values(values: &[Vec<String>]) -> Vec<SheetRow> {
    let Some((header, body)) = values.split_first() else {
        return Vec::new();
    };
    let Some(code_col) = header.iter().position(|h| h.contains("Code")) else {
        return Vec::new();
    };
    let column = |name: &str| header.iter().position(|h| h.trim() == name);
    let (date_col, qty_col, price_col) = (column("BuyDate"), column("Qty"), column("Price"));

    let cell = |row: &Vec<String>, col: Option<usize>, default: &dyn Fn() -> String| {
        col.and_then(|c| row.get(c))
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
            .map(str::to_string)
            .unwrap_or_else(default)
    };

    body.iter()
        .filter_map(|row| {
            let code = row.get(code_col).map(|c| c.trim()).unwrap_or_default();
            if code.is_empty() {
                return None;
            }
            Some(SheetRow {
                code: code.to_string(),
                buy_date: cell(row, date_col, &today),
                qty: cell(row, qty_col, &|| "0".to_string()),
                price: cell(row, price_col, &|| "0.0".to_string()),
            })
        })
        .collect()
}

/// Header plus one value row per sheet row.
pub fn values_from_rows(rows: &[SheetRow]) -> Vec<Vec<String>> {
    std::iter::once(COLUMNS.iter().map(|c| c.to_string()).collect())
        .chain(rows.iter().map(SheetRow::to_values))
        .collect()
}

/// Rebuild rows for a full-set save.
///
/// Rows for codes still listed keep their metadata (first occurrence wins);
/// codes without a row get a fresh one, appended in sorted order. Rows whose
/// code cell is not a stock code are not part of the watchlist and stay.
pub fn mirror_rows(existing: Vec<SheetRow>, watchlist: &Watchlist) -> Vec<SheetRow> {
    let mut seen: BTreeSet<StockCode> = BTreeSet::new();
    let mut rows: Vec<SheetRow> = existing
        .into_iter()
        .filter(|row| match row.stock_code() {
            Some(code) => watchlist.contains(&code) && seen.insert(code),
            None => true,
        })
        .collect();

    for code in watchlist {
        if !seen.contains(code) {
            rows.push(SheetRow::new(code));
        }
    }
    rows
}

/// Rows plus the number of value rows they were read from.
struct Table {
    rows: Vec<SheetRow>,
    height: usize,
}

/// Spreadsheet backend.
pub struct SheetBackend {
    client: SheetsClient,
    /// Serializes read-modify-write cycles within the process
    lock: Mutex<()>,
}

impl SheetBackend {
    /// Create a new sheet backend. Fails on unusable credentials.
    pub fn new(config: SheetConfig) -> Result<Self> {
        Ok(Self {
            client: SheetsClient::new(&config)?,
            lock: Mutex::new(()),
        })
    }

    /// Get the API client.
    pub fn client(&self) -> &SheetsClient {
        &self.client
    }

    /// Read every row, including rows without a valid code.
    pub async fn rows(&self) -> Result<Vec<SheetRow>> {
        let _guard = self.lock.lock().await;
        Ok(self.read_table().await?.rows)
    }

    /// Insert or overwrite the row for a code.
    pub async fn upsert(&self, row: SheetRow) -> Result<Upsert> {
        let code = row
            .stock_code()
            .ok_or_else(|| Error::InvalidStockCode(row.code.clone()))?;

        let _guard = self.lock.lock().await;
        let mut table = self.read_table().await?;
        let outcome = match table
            .rows
            .iter_mut()
            .find(|r| r.stock_code().as_ref() == Some(&code))
        {
            Some(existing) => {
                *existing = row;
                Upsert::Updated
            }
            None => {
                table.rows.push(row);
                Upsert::Added
            }
        };
        self.write_table(&table.rows, table.height).await?;
        debug!(%code, ?outcome, "Upserted sheet row");
        Ok(outcome)
    }

    /// Delete the rows for a code. Returns false if none existed.
    pub async fn remove(&self, code: &StockCode) -> Result<bool> {
        let _guard = self.lock.lock().await;
        let mut table = self.read_table().await?;
        let before = table.rows.len();
        table.rows.retain(|r| r.stock_code().as_ref() != Some(code));
        if table.rows.len() == before {
            return Ok(false);
        }
        self.write_table(&table.rows, table.height).await?;
        Ok(true)
    }

    /// Delete every row below the header.
    pub async fn clear(&self) -> Result<()> {
        let _guard = self.lock.lock().await;
        self.client.clear_values(&self.client.range("A2:D")).await
    }

    async fn read_table(&self) -> Result<Table> {
        let values = self.client.get_values(&self.client.range("A1:D")).await?;
        Ok(Table {
            rows: rows_from_values(&values),
            height: values.len(),
        })
    }

    async fn write_table(&self, rows: &[SheetRow], previous_height: usize) -> Result<()> {
        let values = values_from_rows(rows);
        let height = values.len();
        self.client
            .update_values(&self.client.range(&format!("A1:D{}", height)), &values)
            .await?;
        if previous_height > height {
            self.client
                .clear_values(&self.client.range(&format!("A{}:D", height + 1)))
                .await?;
        }
        Ok(())
    }
}

#[async_trait]
impl WatchlistStore for SheetBackend {
    async fn load(&self) -> Result<Watchlist> {
        let rows = self.rows().await?;
        let mut watchlist = Watchlist::new();
        for row in &rows {
            match row.stock_code() {
                Some(code) => {
                    watchlist.insert(code);
                }
                None => warn!(code = %row.code, "Skipping sheet row without a valid stock code"),
            }
        }
        Ok(watchlist)
    }

    async fn save(&self, watchlist: &Watchlist) -> Result<()> {
        let _guard = self.lock.lock().await;
        let table = self.read_table().await?;
        let rows = mirror_rows(table.rows, watchlist);
        self.write_table(&rows, table.height).await?;
        debug!(rows = rows.len(), "Saved sheet");
        Ok(())
    }

    fn store_type(&self) -> StoreType {
        StoreType::Sheet
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(self.rows().await.is_ok())
    }
}
