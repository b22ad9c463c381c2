//! Locations of the two ledger files and whole-file load/save.
//!
//! Saves truncate and rewrite the file in place. A crash mid-write can leave
//! a partial file, which the tolerant decoders will then read lossily.

use crate::catalog::Catalog;
use crate::codec::{history, inventory, Decoded};
use crate::error::{LedgerError, Result};
use crate::product::Product;
use crate::report::SalesReport;
use crate::sale::Sale;
use log::{debug, warn};
use std::fs::{self, File};
use std::io::{self, BufWriter};
use std::path::{Path, PathBuf};

/// Default inventory file name.
pub const INVENTORY_FILE: &str = "inventory.txt";

/// Default sales history file name.
pub const SALES_HISTORY_FILE: &str = "sales_history.txt";

/// Default file name for exported sales reports.
pub const SALES_REPORT_FILE: &str = "sales_report.csv";

/// Paths of the ledger files and the report export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerFiles {
    pub inventory: PathBuf,
    pub sales_history: PathBuf,
    pub sales_report: PathBuf,
}

impl LedgerFiles {
    /// Both files inside `dir`, under their default names.
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        LedgerFiles {
            inventory: dir.join(INVENTORY_FILE),
            sales_history: dir.join(SALES_HISTORY_FILE),
            sales_report: dir.join(SALES_REPORT_FILE),
        }
    }

    /// Loads products. A missing file is an empty catalog.
    pub fn load_inventory(&self) -> Result<Decoded<Product>> {
        let decoded = read_optional(&self.inventory)?
            .map(|text| inventory::decode(&text))
            .unwrap_or_default();
        report_load(&self.inventory, &decoded);
        Ok(decoded)
    }

    /// Loads finalized sales. A missing file is an empty history.
    pub fn load_sales_history(&self) -> Result<Decoded<Sale>> {
        let decoded = read_optional(&self.sales_history)?
            .map(|text| history::decode(&text))
            .unwrap_or_default();
        report_load(&self.sales_history, &decoded);
        Ok(decoded)
    }

    /// Rewrites the inventory file from the catalog.
    pub fn save_inventory(&self, catalog: &Catalog) -> Result<()> {
        write_with(&self.inventory, |w| inventory::encode(catalog, w))
    }

    /// Rewrites the sales history file, pricing items from the catalog.
    pub fn save_sales_history(&self, sales: &[Sale], catalog: &Catalog) -> Result<()> {
        write_with(&self.sales_history, |w| history::encode(sales, catalog, w))
    }

    /// Writes the report as CSV, replacing any earlier export.
    pub fn save_sales_report(&self, report: &SalesReport) -> Result<()> {
        let file = File::create(&self.sales_report).map_err(|source| LedgerError::Persistence {
            path: self.sales_report.clone(),
            source,
        })?;
        report.write_csv(BufWriter::new(file))?;
        debug!("Wrote {}", self.sales_report.display());
        Ok(())
    }
}

impl Default for LedgerFiles {
    fn default() -> Self {
        LedgerFiles::in_dir(".")
    }
}

fn read_optional(path: &Path) -> Result<Option<String>> {
    match fs::read(path) {
        Ok(bytes) => Ok(Some(String::from_utf8_lossy(&bytes).into_owned())),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            debug!("{} does not exist yet, starting empty", path.display());
            Ok(None)
        }
        Err(e) => Err(LedgerError::Io(e)),
    }
}

fn report_load<T>(path: &Path, decoded: &Decoded<T>) {
    if !decoded.is_lossless() {
        warn!(
            "{}: loaded {} record(s), dropped {} malformed line(s)",
            path.display(),
            decoded.items.len(),
            decoded.skipped.len()
        );
    } else {
        debug!("{}: loaded {} record(s)", path.display(), decoded.items.len());
    }
}

fn write_with<F>(path: &Path, encode: F) -> Result<()>
where
    F: FnOnce(&mut BufWriter<File>) -> io::Result<()>,
{
    let persistence = |source: io::Error| LedgerError::Persistence {
        path: path.to_path_buf(),
        source,
    };

    let file = File::create(path).map_err(persistence)?;
    let mut writer = BufWriter::new(file);
    encode(&mut writer).map_err(persistence)?;
    debug!("Wrote {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::Money;

    #[test]
    fn test_missing_files_load_empty() {
        let dir = tempfile::tempdir().unwrap();
        let files = LedgerFiles::in_dir(dir.path());
        assert!(files.load_inventory().unwrap().items.is_empty());
        assert!(files.load_sales_history().unwrap().items.is_empty());
    }

    #[test]
    fn test_save_then_load_inventory() {
        let dir = tempfile::tempdir().unwrap();
        let files = LedgerFiles::in_dir(dir.path());
        let catalog: Catalog = [Product::new("123456", "Soap Bar", 12, Money::from_cents(199)).unwrap()]
            .into_iter()
            .collect();

        files.save_inventory(&catalog).unwrap();
        assert_eq!(
            fs::read_to_string(dir.path().join(INVENTORY_FILE)).unwrap(),
            "123456 Soap Bar|12 1.99\n"
        );
        assert_eq!(files.load_inventory().unwrap().items[0].name, "Soap Bar");
    }

    #[test]
    fn test_save_sales_report_as_csv() {
        let dir = tempfile::tempdir().unwrap();
        let files = LedgerFiles::in_dir(dir.path());
        let report = SalesReport {
            rows: vec![crate::report::ReportRow {
                product_id: "123456".to_string(),
                name: "Soap Bar".to_string(),
                quantity_sold: 3,
                unit_price: Money::from_cents(199),
                subtotal: Money::from_cents(597),
            }],
            grand_total: Money::from_cents(597),
        };

        files.save_sales_report(&report).unwrap();
        assert_eq!(
            fs::read_to_string(dir.path().join(SALES_REPORT_FILE)).unwrap(),
            "product_id,name,quantity_sold,unit_price,subtotal\n123456,Soap Bar,3,1.99,5.97\n"
        );
    }

    #[test]
    fn test_unwritable_location_is_persistence_error() {
        let dir = tempfile::tempdir().unwrap();
        let files = LedgerFiles::in_dir(dir.path().join("missing-subdir"));
        let err = files.save_inventory(&Catalog::new()).unwrap_err();
        assert!(matches!(err, LedgerError::Persistence { .. }));
    }
}
