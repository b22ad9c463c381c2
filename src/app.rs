//! Interactive menus: cashier, inventory and admin.
//!
//! All input errors are reported and re-prompted locally. End of input
//! unwinds every menu as `InputClosed`, cancelling an open sale on the way
//! out, and `run` treats it as a normal exit.

use crate::auth::{AdminKey, Authorizer};
use crate::catalog::ProductEdit;
use crate::clock::{Clock, LocalClock};
use crate::console::Console;
use crate::error::{LedgerError, Result};
use crate::ids::{IdSource, UuidIdSource};
use crate::money::Money;
use crate::product::{validate_name, validate_price, Product};
use crate::report::{aggregate, SalesSummary};
use crate::sale::Sale;
use crate::store::Store;
use crate::workflow::{resolve, ProductQuery, Resolution, SaleSession, SaleState};
use log::warn;
use std::io::{BufRead, Write};
use std::str::FromStr;

const RULE_WIDTH: usize = 70;

enum CashierAction {
    Add,
    Delete,
    Pay,
    Cancel,
}

/// The interactive point-of-sale session.
pub struct App<R, W> {
    store: Store,
    console: Console<R, W>,
    auth: Box<dyn Authorizer>,
    ids: Box<dyn IdSource>,
    clock: Box<dyn Clock>,
}

impl<R: BufRead, W: Write> App<R, W> {
    /// Creates an app with the default admin key, UUID-derived IDs and the
    /// local clock.
    pub fn new(store: Store, console: Console<R, W>) -> Self {
        App {
            store,
            console,
            auth: Box::new(AdminKey::default()),
            ids: Box::new(UuidIdSource),
            clock: Box::new(LocalClock),
        }
    }

    pub fn with_authorizer(mut self, auth: impl Authorizer + 'static) -> Self {
        self.auth = Box::new(auth);
        self
    }

    pub fn with_id_source(mut self, ids: impl IdSource + 'static) -> Self {
        self.ids = Box::new(ids);
        self
    }

    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    /// Returns the store and the console's output sink.
    pub fn into_parts(self) -> (Store, W) {
        (self.store, self.console.into_output())
    }

    /// Runs the main menu until the user exits or input ends.
    pub fn run(&mut self) -> Result<()> {
        match self.main_menu() {
            Err(LedgerError::InputClosed) => Ok(()),
            other => other,
        }
    }

    fn main_menu(&mut self) -> Result<()> {
        loop {
            self.report_write_failures()?;
            self.console.blank()?;
            self.console.say("Main Menu")?;
            self.console.say("1. Cashier")?;
            self.console.say("2. Inventory")?;
            self.console.say("3. Admin")?;
            self.console.say("4. Exit")?;

            match self.ask_number("Enter choice: ")? {
                Some(1) => self.cashier_mode()?,
                Some(2) => self.inventory_mode()?,
                Some(3) => {
                    let key = self.console.ask("Enter Admin Key: ")?;
                    if self.auth.authorize(&key) {
                        self.admin_mode()?;
                    } else {
                        self.console.say("Invalid Admin Key.")?;
                    }
                }
                Some(4) => {
                    self.console.say("Exiting system. Goodbye!")?;
                    return Ok(());
                }
                Some(_) => self
                    .console
                    .say("Invalid choice. Please enter a number between 1 and 4.")?,
                None => self.console.say("Invalid input. Please enter a number.")?,
            }
        }
    }

    fn admin_mode(&mut self) -> Result<()> {
        loop {
            self.console.blank()?;
            self.console.say("Admin Menu")?;
            self.console.say("1. View Aggregated Sales Report")?;
            self.console.say("2. Export Sales Report (CSV)")?;
            self.console.say("3. Inventory Management")?;
            self.console.say("4. Back to Main Menu")?;

            match self.ask_number("Enter choice: ")? {
                Some(1) => {
                    let summary = aggregate(self.store.history(), self.store.catalog());
                    self.console.say("Aggregated Sales Report")?;
                    self.console.say(summary)?;
                }
                Some(2) => self.export_report()?,
                Some(3) => self.inventory_mode()?,
                Some(4) => return Ok(()),
                Some(_) => self
                    .console
                    .say("Invalid choice. Please enter a number between 1 and 4.")?,
                None => self.console.say("Invalid input. Please enter a number.")?,
            }
        }
    }

    fn export_report(&mut self) -> Result<()> {
        let report = match aggregate(self.store.history(), self.store.catalog()) {
            SalesSummary::Report(report) => report,
            no_data @ SalesSummary::NoData => return self.console.say(no_data),
        };

        let Some(files) = self.store.files() else {
            return self
                .console
                .say("No data directory configured. Report not exported.");
        };

        let outcome = match files.save_sales_report(&report) {
            Ok(()) => format!("Sales report exported to {}", files.sales_report.display()),
            Err(e) => format!("Error: {}", e),
        };
        self.console.say(outcome)
    }

    // ---------------------------------------------------------------------
    // Cashier
    // ---------------------------------------------------------------------

    fn cashier_mode(&mut self) -> Result<()> {
        let mut session = SaleSession::begin(&self.store, self.ids.as_mut())?;
        let result = self.cashier_loop(&mut session);

        if !session.state().is_terminal() {
            if let Err(e) = session.cancel(&mut self.store) {
                warn!("Could not cancel abandoned sale: {}", e);
            }
        }
        result
    }

    fn cashier_loop(&mut self, session: &mut SaleSession) -> Result<()> {
        loop {
            self.report_write_failures()?;
            self.console.blank()?;
            self.console.say("Available Products in Inventory:")?;
            self.show_inventory()?;
            self.show_cart(session.sale())?;

            let mut actions = vec![
                ("Add Product Sale", CashierAction::Add),
                ("Delete Punched Product", CashierAction::Delete),
            ];
            if !session.is_empty() {
                actions.push(("Proceed to Payment", CashierAction::Pay));
            }
            actions.push(("Cancel Transaction", CashierAction::Cancel));

            for (idx, (label, _)) in actions.iter().enumerate() {
                self.console.say(format!("{}. {}", idx + 1, label))?;
            }

            let action = match self.ask_number("Enter choice: ")? {
                Some(n) if (1..=actions.len()).contains(&n) => &actions[n - 1].1,
                _ => {
                    self.console
                        .say("Invalid choice. Please enter a valid option number.")?;
                    continue;
                }
            };

            match action {
                CashierAction::Add => self.add_to_sale(session)?,
                CashierAction::Delete => self.delete_from_sale(session)?,
                CashierAction::Pay => return self.checkout(session),
                CashierAction::Cancel => {
                    if !session.is_empty() {
                        self.console.say("Restoring stock for cancelled items...")?;
                    }
                    session.cancel(&mut self.store)?;
                    return self.console.say("Transaction cancelled.");
                }
            }
        }
    }

    fn add_to_sale(&mut self, session: &mut SaleSession) -> Result<()> {
        self.console.say("How would you like to find the product?")?;
        self.console.say("1. By Product ID")?;
        self.console.say("2. By Product Name")?;
        self.console.say("0. Cancel Adding")?;

        let query = match self.ask_number("Enter choice: ")? {
            Some(0) => return Ok(()),
            Some(1) => {
                let id = self.console.ask("Enter Product ID (or '0' to cancel): ")?;
                if id.is_empty() || id == "0" {
                    return Ok(());
                }
                ProductQuery::Id(id)
            }
            Some(2) => {
                let term = self.console.ask("Enter Product Name (or '0' to cancel): ")?;
                if term.is_empty() || term == "0" {
                    return Ok(());
                }
                ProductQuery::Name(term)
            }
            _ => {
                return self
                    .console
                    .say("Invalid search choice. Cancelling add product.");
            }
        };

        let selected = match resolve(self.store.catalog(), &query) {
            Resolution::NotFound => None,
            Resolution::Unique(product) => Some(product),
            Resolution::Ambiguous(matches) => self.pick_one(matches)?,
        };

        let Some(product) = selected else {
            return self.console.say("Product not found or selection cancelled.");
        };

        if product.quantity == 0 {
            return self
                .console
                .say(format!("Product '{}' is out of stock.", product.name));
        }

        self.console.say(format!("Selected Product: {}", product.name))?;
        self.console.say(format!("Available Stock: {}", product.quantity))?;
        self.console.say(format!("Price per piece: ${}", product.price))?;

        loop {
            let input = self.console.ask("Enter quantity to add (or '0' to cancel): ")?;
            let requested = match input.trim().parse::<i64>() {
                Ok(0) => return Ok(()),
                Ok(n) if n < 0 => {
                    self.console.say("Error: Quantity cannot be negative.")?;
                    continue;
                }
                Ok(n) => u32::try_from(n).unwrap_or(u32::MAX),
                Err(_) => {
                    self.console.say("Error: Invalid input. Please enter a number.")?;
                    continue;
                }
            };

            let added = match session
                .add_item(&mut self.store, &product.id, requested)
                .map(|item| item.quantity)
            {
                Err(LedgerError::InsufficientStock { available, .. }) => {
                    self.console
                        .say(format!("Insufficient stock. Available: {}", available))?;
                    let prompt = format!("Add available quantity ({}) instead? (y/n): ", available);
                    if !self.console.confirm(&prompt)? {
                        return self.console.say("Product not added.");
                    }
                    session
                        .add_item(&mut self.store, &product.id, available)
                        .map(|item| item.quantity)
                }
                other => other,
            };

            return match added {
                Ok(qty) => {
                    self.console
                        .say(format!("Product added to sale: {} x {}", qty, product.name))?;
                    self.console.say(format!(
                        "Cost: {} pcs x ${} = ${}",
                        qty,
                        product.price,
                        product.price * qty
                    ))
                }
                Err(e) => self.console.say(e),
            };
        }
    }

    fn pick_one(&mut self, matches: Vec<Product>) -> Result<Option<Product>> {
        self.console.say("Multiple products found. Please choose one:")?;
        for (idx, p) in matches.iter().enumerate() {
            self.console.say(format!(
                "{}. {} (ID: {}, Stock: {}, Price: ${})",
                idx + 1,
                p.name,
                p.id,
                p.quantity,
                p.price
            ))?;
        }

        match self.ask_number("Enter your choice (number) or 0 to cancel: ")? {
            Some(0) => Ok(None),
            Some(n) if n <= matches.len() => Ok(matches.into_iter().nth(n - 1)),
            _ => {
                self.console.say("Invalid selection. Product not chosen.")?;
                Ok(None)
            }
        }
    }

    fn delete_from_sale(&mut self, session: &mut SaleSession) -> Result<()> {
        if session.is_empty() {
            return self.console.say("No products in the current sale to delete.");
        }

        let key = self
            .console
            .ask("Enter Admin Key to delete product from sale: ")?;
        if !self.auth.authorize(&key) {
            return self.console.say("Invalid Admin Key. Deletion cancelled.");
        }

        let id = self
            .console
            .ask("Enter Product ID of item to remove from sale: ")?;
        match session.remove_item(&mut self.store, self.auth.as_ref(), &key, id.trim()) {
            Ok(_) => self.console.say("Product removed from sale. Stock restored."),
            Err(e) => self.console.say(e),
        }
    }

    fn checkout(&mut self, session: &mut SaleSession) -> Result<()> {
        if session.proceed_to_payment()? == SaleState::AwaitingCustomerName {
            loop {
                let name = self.console.ask("Enter Customer Name: ")?;
                match session.set_customer_name(&name) {
                    Ok(()) => break,
                    Err(LedgerError::Validation(_)) => self
                        .console
                        .say("Error: Customer name cannot be empty. Please try again.")?,
                    Err(e) => return Err(e),
                }
            }
        }

        let mut preview = session.sale().clone();
        preview.total_amount = session.total_due(self.store.catalog());
        self.console.blank()?;
        self.console.say("RECEIPT PREVIEW")?;
        self.print_receipt(&preview, false)?;

        loop {
            let input = self.console.ask("Customer Cash: $")?;
            let cash = match Money::from_str(&input) {
                Ok(cash) => cash,
                Err(_) => {
                    self.console
                        .say("Invalid input for cash. Please enter a numeric value.")?;
                    continue;
                }
            };

            match session.pay(&mut self.store, cash, self.clock.as_ref()) {
                Ok(_) => break,
                Err(LedgerError::InsufficientCash { total, .. }) => self.console.say(format!(
                    "Error: Insufficient cash. Total amount is ${}",
                    total
                ))?,
                Err(e) => return Err(e),
            }
        }

        self.report_write_failures()?;
        self.console.blank()?;
        self.console.say("FINAL RECEIPT")?;
        let sale = session.sale().clone();
        self.print_receipt(&sale, true)?;
        self.console.say("Transaction completed. Receipt saved.")
    }

    fn print_receipt(&mut self, sale: &Sale, paid: bool) -> Result<()> {
        let heavy = "=".repeat(38);
        let light = "-".repeat(38);

        self.console.say(&heavy)?;
        self.console.say(format!("Receipt ID: {}", sale.receipt_id))?;
        self.console.say(format!("Customer Name: {}", sale.customer_name))?;
        if paid {
            self.console.say(format!("Date and Time: {}", sale.timestamp))?;
            self.console.say(&light)?;
        }
        self.console.say("Items:")?;
        for item in &sale.line_items {
            if let Ok(p) = self.store.catalog().find(&item.product_id) {
                let line = format!(
                    "  {} x{} @ ${} = ${}",
                    p.name,
                    item.quantity,
                    p.price,
                    p.price * item.quantity
                );
                self.console.say(line)?;
            }
        }
        self.console.say(&light)?;
        if paid {
            self.console.say(format!("Total Amount:  ${}", sale.total_amount))?;
            self.console.say(format!("Customer Cash: ${}", sale.customer_cash))?;
            self.console.say(format!("Change:        ${}", sale.change))?;
        } else {
            self.console.say(format!("Total Amount: ${}", sale.total_amount))?;
        }
        self.console.say(&heavy)
    }

    fn show_cart(&mut self, sale: &Sale) -> Result<()> {
        if sale.line_items.is_empty() {
            return self.console.say("No Products added yet.");
        }

        let rule = "-".repeat(65);
        self.console.say(format!(
            "Current Products in Sale (Receipt ID: {}):",
            sale.receipt_id
        ))?;
        self.console.say(&rule)?;
        self.console.say(format!(
            "{:<10}{:<25}{:<10}{:<10}{:<10}",
            "ID", "Product Name", "Quantity", "Unit $", "Total $"
        ))?;
        self.console.say(&rule)?;
        for item in &sale.line_items {
            if let Ok(p) = self.store.catalog().find(&item.product_id) {
                let line = format!(
                    "{:<10}{:<25}{:<10}{:<10}{:<10}",
                    p.id,
                    p.name,
                    item.quantity,
                    p.price.to_string(),
                    (p.price * item.quantity).to_string()
                );
                self.console.say(line)?;
            }
        }
        self.console.say(&rule)?;
        let subtotal = sale.total_at_current_prices(self.store.catalog());
        self.console
            .say(format!("{:>55}${}", "Current Subtotal: ", subtotal))
    }

    // ---------------------------------------------------------------------
    // Inventory
    // ---------------------------------------------------------------------

    fn inventory_mode(&mut self) -> Result<()> {
        loop {
            self.report_write_failures()?;
            self.console.blank()?;
            self.console.say("Inventory Menu")?;
            self.console.say("1. Add New Product")?;
            self.console.say("2. View Inventory")?;
            self.console.say("3. Search Product by ID")?;
            self.console.say("4. Refill Stock")?;
            self.console.say("5. Edit Product")?;
            self.console.say("6. Back")?;

            match self.ask_number("Enter choice: ")? {
                Some(1) => self.add_new_product()?,
                Some(2) => self.show_inventory()?,
                Some(3) => self.search_product()?,
                Some(4) => self.refill_stock()?,
                Some(5) => self.edit_product()?,
                Some(6) => return Ok(()),
                Some(_) => self
                    .console
                    .say("Invalid choice. Please enter a number between 1 and 6.")?,
                None => self.console.say("Invalid input. Please enter a number.")?,
            }
        }
    }

    fn show_inventory(&mut self) -> Result<()> {
        let rule = "-".repeat(RULE_WIDTH);
        self.console.say(format!(
            "{:<10}{:<30}{:<10}{:<10}{}",
            "ID", "Product Name", "Quantity", "Price", "Status"
        ))?;
        self.console.say(&rule)?;

        if self.store.catalog().is_empty() {
            self.console.say("Inventory is empty.")?;
        } else {
            let lines: Vec<String> = self
                .store
                .catalog()
                .iter()
                .map(|p| {
                    format!(
                        "{:<10}{:<30}{:<10}{:<10}{}",
                        p.id,
                        p.name,
                        p.quantity,
                        p.price.to_string(),
                        p.status()
                    )
                })
                .collect();
            for line in lines {
                self.console.say(line)?;
            }
        }

        self.console.say(&rule)
    }

    fn add_new_product(&mut self) -> Result<()> {
        let name = loop {
            let name = self.console.ask("Enter product name: ")?;
            match validate_name(&name) {
                Ok(()) => break name,
                Err(e) => self.console.say(format!("Error: {}. Please try again.", e))?,
            }
        };

        let quantity = loop {
            let input = self.console.ask("Enter quantity: ")?;
            match input.trim().parse::<i64>() {
                Ok(n) if n < 0 => self.console.say(
                    "Error: Quantity cannot be negative. Please enter a non-negative number.",
                )?,
                Ok(n) => match u32::try_from(n) {
                    Ok(q) => break q,
                    Err(_) => self.console.say(
                        "Error: Quantity out of range. Please enter a smaller whole number.",
                    )?,
                },
                Err(_) => self
                    .console
                    .say("Error: Invalid quantity. Please enter a whole number.")?,
            }
        };

        let price = loop {
            let input = self.console.ask("Enter price: $")?;
            match Money::from_str(&input) {
                Ok(p) => match validate_price(p) {
                    Ok(()) => break p,
                    Err(e) => self
                        .console
                        .say(format!("Error: {}. Please enter a valid price.", e))?,
                },
                Err(_) => self.console.say(
                    "Error: Invalid price format. Please enter a numeric value (e.g., 12.99).",
                )?,
            }
        };

        let product = match self
            .store
            .add_product(name, quantity, price, self.ids.as_mut())
        {
            Ok(product) => product,
            Err(e) => return self.console.say(format!("Error: {}", e)),
        };
        self.console.say("Product added successfully.")?;
        self.console.say(format!(
            "ID: {} | Name: {} | Qty: {} | Price: ${}",
            product.id, product.name, product.quantity, product.price
        ))
    }

    fn search_product(&mut self) -> Result<()> {
        let id = self.console.ask("Enter Product ID to search: ")?;
        let details = match self.store.catalog().find(id.trim()) {
            Ok(p) => format!(
                "Product ID: {}\nProduct Name: {}\nQuantity: {}\nPrice: ${}",
                p.id, p.name, p.quantity, p.price
            ),
            Err(_) => "Product not found.".to_string(),
        };
        self.console.say(details)
    }

    fn refill_stock(&mut self) -> Result<()> {
        self.show_inventory()?;
        let id = self
            .console
            .ask("Enter product ID to refill (or '0' to cancel): ")?;
        let id = id.trim();
        if id.is_empty() || id == "0" {
            return self.console.say("Refill operation cancelled.");
        }

        let product = match self.store.catalog().find(id) {
            Ok(p) => p.clone(),
            Err(e) => return self.console.say(format!("Error: {}.", e)),
        };
        self.console.say(format!(
            "ID: {} | Name: {} | Current Qty: {} | Price: ${}",
            product.id, product.name, product.quantity, product.price
        ))?;

        loop {
            let input = self
                .console
                .ask("Enter quantity to add (must be positive, or '0' to cancel): ")?;
            let input = input.trim();
            if input == "0" {
                return self.console.say("Refill cancelled for this item.");
            }
            match input.parse::<u32>() {
                Ok(qty) if qty > 0 => match self.store.refill(&product.id, qty) {
                    Ok(updated) => {
                        self.console.say("Stock updated successfully!")?;
                        return self.console.say(format!(
                            "New quantity for {}: {}",
                            updated.name, updated.quantity
                        ));
                    }
                    Err(e) => self.console.say(format!("Error: {}", e))?,
                },
                Ok(_) => self.console.say("Error: Quantity to add must be positive.")?,
                Err(_) if input.starts_with('-') => {
                    self.console.say("Error: Quantity to add must be positive.")?
                }
                Err(_) => self
                    .console
                    .say("Error: Invalid quantity. Please enter a whole number.")?,
            }
        }
    }

    fn edit_product(&mut self) -> Result<()> {
        let key = self.console.ask("Enter Admin Key to edit stocks: ")?;
        if !self.auth.authorize(&key) {
            return self.console.say("Invalid Admin Key. Operation cancelled.");
        }

        self.show_inventory()?;
        let id = self
            .console
            .ask("Enter Product ID to edit (or '0' to cancel): ")?;
        let id = id.trim();
        if id.is_empty() || id == "0" {
            return self.console.say("Edit operation cancelled.");
        }

        let current = match self.store.catalog().find(id) {
            Ok(p) => p.clone(),
            Err(_) => {
                return self
                    .console
                    .say(format!("Product with ID '{}' not found.", id));
            }
        };

        self.console.say(format!("Editing Product ID: {}", current.id))?;
        self.console
            .say("Enter new values. Press Enter to keep current value.")?;

        let mut edit = ProductEdit::default();

        let name = self
            .console
            .ask(&format!("New Name (current: {}): ", current.name))?;
        if !name.is_empty() {
            edit.name = Some(name);
        }

        let quantity = self
            .console
            .ask(&format!("New Quantity (current: {}): ", current.quantity))?;
        if !quantity.trim().is_empty() {
            match quantity.trim().parse::<i64>() {
                Ok(q) => edit.quantity = Some(q),
                Err(_) => self
                    .console
                    .say("Invalid quantity input. Value not changed.")?,
            }
        }

        let price = self
            .console
            .ask(&format!("New Price (current: ${}): $", current.price))?;
        if !price.trim().is_empty() {
            match Money::from_str(&price) {
                Ok(p) => edit.price = Some(p),
                Err(_) => self.console.say("Invalid price input. Value not changed.")?,
            }
        }

        for rejection in self.store.edit(&current.id, edit)? {
            self.console.say(rejection)?;
        }

        let updated = self.store.catalog().find(&current.id)?.clone();
        self.console.say("Product details updated successfully!")?;
        self.console.say(format!(
            "ID: {} | Name: {} | Quantity: {} | Price: ${}",
            updated.id, updated.name, updated.quantity, updated.price
        ))
    }

    // ---------------------------------------------------------------------
    // Helpers
    // ---------------------------------------------------------------------

    /// Reads a non-negative menu number; `None` if the input is not one.
    fn ask_number(&mut self, prompt: &str) -> Result<Option<usize>> {
        let input = self.console.ask(prompt)?;
        Ok(input.trim().parse::<usize>().ok())
    }

    fn report_write_failures(&mut self) -> Result<()> {
        for failure in self.store.take_write_failures() {
            self.console.say(format!("Error: {}", failure))?;
        }
        Ok(())
    }
}
