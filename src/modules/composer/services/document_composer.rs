// Invoice document composition.
//
// Renders the fixed-structure billing document: branding header,
// patient/admission facts, summary table, categorized detailed breakup,
// totals panel, footer, and an optional narrative page. Composition is a
// pure function of its inputs and can run concurrently across invoices.

use chrono::Utc;
use rust_decimal::Decimal;

use crate::core::money;
use crate::core::Result;
use crate::modules::composer::layout::{
    columns::{fit_columns, Align, ColumnSpec},
    page::{PageBuilder, RGB_ACCENT, RGB_MUTED, RGB_RULE, RGB_TEXT},
    text::{fit_cell_text, wrap_text},
};
use crate::modules::composer::models::{
    age_years, ComposeOptions, HospitalIdentity, InvoiceDocumentData,
};
use crate::modules::ledger::models::{LineItem, LineItemType};

const ROW_HEIGHT: f32 = 6.0;
const HEADER_ROW_HEIGHT: f32 = 7.0;
const CELL_PADDING: f32 = 1.5;
const BODY_SIZE: f32 = 9.0;
const LABEL_SIZE: f32 = 8.0;

/// Minimum vertical room the footer wants; below this it is pinned to a
/// fixed bottom offset instead of forcing a page break
const FOOTER_MIN_HEIGHT: f32 = 18.0;
const FOOTER_BOTTOM_OFFSET: f32 = 10.0;

/// Category rendering order in the detailed breakup
const CATEGORY_ORDER: [LineItemType; 4] = [
    LineItemType::Room,
    LineItemType::Medication,
    LineItemType::Lab,
    LineItemType::Custom,
];

pub struct DocumentComposer {
    identity: HospitalIdentity,
}

impl DocumentComposer {
    pub fn new(identity: HospitalIdentity) -> Self {
        Self { identity }
    }

    /// Compose the invoice document into an immutable byte buffer
    pub fn compose(
        &self,
        data: &InvoiceDocumentData,
        options: &ComposeOptions,
    ) -> Result<Vec<u8>> {
        let title = format!("Invoice {}", data.invoice_number);
        let mut page = PageBuilder::new(&title)?;

        self.draw_header(&mut page, data);
        self.draw_facts_block(&mut page, data);
        self.draw_summary_table(&mut page, data, options.collapse_summary);
        self.draw_detailed_breakup(&mut page, data);
        self.draw_totals_panel(&mut page, data);
        self.draw_footer(&mut page);

        if !options.narrative.is_empty() {
            self.draw_narrative_page(&mut page, options);
        }

        page.finalize()
    }

    fn amount(&self, value: Decimal) -> String {
        money::format_amount_with_symbol(&self.identity.currency_symbol, value)
    }

    // (a) branding header
    fn draw_header(&self, page: &mut PageBuilder, data: &InvoiceDocumentData) {
        let y = page.cursor();
        page.text_bold(&self.identity.name, page.left(), y - 6.0, 16.0, RGB_ACCENT);
        page.text(&self.identity.address, page.left(), y - 12.0, LABEL_SIZE, RGB_MUTED);
        page.text(&self.identity.contact, page.left(), y - 16.0, LABEL_SIZE, RGB_MUTED);

        page.text_right("INVOICE", page.right(), y - 6.0, 14.0, true, RGB_TEXT);
        page.text_right(
            &data.invoice_number,
            page.right(),
            y - 12.0,
            BODY_SIZE,
            false,
            RGB_TEXT,
        );
        page.text_right(
            &data.status_label.to_uppercase(),
            page.right(),
            y - 16.0,
            LABEL_SIZE,
            false,
            RGB_MUTED,
        );

        page.advance(20.0);
        page.hline(page.left(), page.right(), page.cursor(), 0.6, RGB_RULE);
        page.advance(6.0);
    }

    // (b) two-column patient/admission fact block
    fn draw_facts_block(&self, page: &mut PageBuilder, data: &InvoiceDocumentData) {
        let facts = &data.facts;
        let age_gender = match facts.date_of_birth {
            Some(dob) => format!("{} / {}", age_years(dob, data.bill_date), facts.gender),
            None => facts.gender.clone(),
        };

        let left_rows = [
            ("Patient", facts.patient_name.as_str()),
            ("Patient ID", facts.patient_code.as_str()),
            ("Age/Gender", age_gender.as_str()),
            ("Address", facts.address.as_str()),
        ];

        let bed = format!("{} / {}", facts.room_label, facts.bed_label);
        let bill_date = data.bill_date.format("%d %b %Y").to_string();
        let right_rows = [
            ("Admission No", facts.admission_number.as_str()),
            ("Bill Date", bill_date.as_str()),
            ("Bed", bed.as_str()),
            ("Attending", facts.attending_clinician.as_str()),
        ];

        let column_x = page.left() + page.content_width() / 2.0;
        let label_width = 24.0;
        let value_width = page.content_width() / 2.0 - label_width - 4.0;

        let mut y = page.cursor();
        for ((l_label, l_value), (r_label, r_value)) in left_rows.iter().zip(right_rows.iter()) {
            y -= ROW_HEIGHT;
            page.text(l_label, page.left(), y, LABEL_SIZE, RGB_MUTED);
            page.text(
                &fit_cell_text(l_value, value_width, BODY_SIZE),
                page.left() + label_width,
                y,
                BODY_SIZE,
                RGB_TEXT,
            );

            page.text(r_label, column_x, y, LABEL_SIZE, RGB_MUTED);
            page.text(
                &fit_cell_text(r_value, value_width, BODY_SIZE),
                column_x + label_width,
                y,
                BODY_SIZE,
                RGB_TEXT,
            );
        }

        page.advance(4.0 * ROW_HEIGHT + 6.0);
    }

    fn summary_columns(&self) -> Vec<ColumnSpec> {
        vec![
            ColumnSpec::new("Item", 80.0, 30.0, 0, Align::Left),
            ColumnSpec::new("Category", 35.0, 20.0, 1, Align::Left),
            ColumnSpec::new("Qty", 20.0, 12.0, 2, Align::Right),
            ColumnSpec::new("Amount", 45.0, 25.0, 3, Align::Right),
        ]
    }

    fn detail_columns(&self) -> Vec<ColumnSpec> {
        vec![
            ColumnSpec::new("Item", 60.0, 25.0, 1, Align::Left),
            ColumnSpec::new("Description", 50.0, 20.0, 0, Align::Left),
            ColumnSpec::new("Qty", 18.0, 12.0, 2, Align::Right),
            ColumnSpec::new("Unit Price", 26.0, 18.0, 3, Align::Right),
            ColumnSpec::new("Amount", 26.0, 20.0, 4, Align::Right),
        ]
    }

    fn draw_table_header(&self, page: &mut PageBuilder, columns: &[ColumnSpec]) {
        page.ensure_space(HEADER_ROW_HEIGHT + 2.0 * ROW_HEIGHT);
        let y = page.cursor() - HEADER_ROW_HEIGHT;

        let mut x = page.left();
        for column in columns {
            match column.align {
                Align::Left => {
                    page.text_bold(column.label, x + CELL_PADDING, y, LABEL_SIZE, RGB_MUTED)
                }
                Align::Right => page.text_right(
                    column.label,
                    x + column.width - CELL_PADDING,
                    y,
                    LABEL_SIZE,
                    true,
                    RGB_MUTED,
                ),
            }
            x += column.width;
        }

        page.advance(HEADER_ROW_HEIGHT + 1.5);
        page.hline(page.left(), page.right(), page.cursor(), 0.4, RGB_RULE);
        page.advance(1.0);
    }

    fn draw_row(
        &self,
        page: &mut PageBuilder,
        columns: &[ColumnSpec],
        cells: &[String],
        bold: bool,
    ) {
        page.ensure_space(ROW_HEIGHT + 2.0);
        let y = page.cursor() - ROW_HEIGHT;

        let mut x = page.left();
        for (column, cell) in columns.iter().zip(cells.iter()) {
            let interior = column.width - 2.0 * CELL_PADDING;
            let fitted = fit_cell_text(cell, interior, BODY_SIZE);
            match column.align {
                Align::Left => {
                    if bold {
                        page.text_bold(&fitted, x + CELL_PADDING, y, BODY_SIZE, RGB_TEXT);
                    } else {
                        page.text(&fitted, x + CELL_PADDING, y, BODY_SIZE, RGB_TEXT);
                    }
                }
                Align::Right => page.text_right(
                    &fitted,
                    x + column.width - CELL_PADDING,
                    y,
                    BODY_SIZE,
                    bold,
                    RGB_TEXT,
                ),
            }
            x += column.width;
        }

        page.advance(ROW_HEIGHT);
    }

    // (c) summary table: one row per item, or one per category when
    // collapsed
    fn draw_summary_table(
        &self,
        page: &mut PageBuilder,
        data: &InvoiceDocumentData,
        collapse: bool,
    ) {
        page.text_bold("Summary", page.left(), page.cursor() - 4.0, 11.0, RGB_TEXT);
        page.advance(7.0);

        let columns = fit_columns(&self.summary_columns(), page.content_width());
        self.draw_table_header(page, &columns);

        if collapse {
            for category in CATEGORY_ORDER {
                let group: Vec<&LineItem> = data
                    .items
                    .iter()
                    .filter(|item| item.item_type == category)
                    .collect();
                if group.is_empty() {
                    continue;
                }

                let subtotal: Decimal = group.iter().map(|item| item.total_price).sum();
                let cells = vec![
                    category.category_label().to_string(),
                    category.to_string(),
                    group.len().to_string(),
                    self.amount(subtotal),
                ];
                self.draw_row(page, &columns, &cells, false);
            }
        } else {
            for item in &data.items {
                let cells = vec![
                    item.item_name.clone(),
                    item.item_type.to_string(),
                    item.quantity.normalize().to_string(),
                    self.amount(item.total_price),
                ];
                self.draw_row(page, &columns, &cells, false);
            }
        }

        page.hline(page.left(), page.right(), page.cursor() - 1.0, 0.4, RGB_RULE);
        page.advance(8.0);
    }

    // (d) detailed breakup grouped under category headers, each group
    // closed by a subtotal row
    fn draw_detailed_breakup(&self, page: &mut PageBuilder, data: &InvoiceDocumentData) {
        page.text_bold(
            "Detailed Breakup",
            page.left(),
            page.cursor() - 4.0,
            11.0,
            RGB_TEXT,
        );
        page.advance(7.0);

        let columns = fit_columns(&self.detail_columns(), page.content_width());
        self.draw_table_header(page, &columns);

        for category in CATEGORY_ORDER {
            let group: Vec<&LineItem> = data
                .items
                .iter()
                .filter(|item| item.item_type == category)
                .collect();
            if group.is_empty() {
                continue;
            }

            page.ensure_space(2.0 * ROW_HEIGHT + 4.0);
            page.text_bold(
                category.category_label(),
                page.left() + CELL_PADDING,
                page.cursor() - ROW_HEIGHT,
                BODY_SIZE,
                RGB_ACCENT,
            );
            page.advance(ROW_HEIGHT + 1.0);

            let mut subtotal = Decimal::ZERO;
            for item in group {
                subtotal += item.total_price;
                let cells = vec![
                    item.item_name.clone(),
                    item.item_description.clone().unwrap_or_default(),
                    item.quantity.normalize().to_string(),
                    self.amount(item.unit_price),
                    self.amount(item.total_price),
                ];
                self.draw_row(page, &columns, &cells, false);
            }

            let cells = vec![
                String::new(),
                String::new(),
                String::new(),
                "Subtotal".to_string(),
                self.amount(subtotal),
            ];
            self.draw_row(page, &columns, &cells, true);
            page.advance(2.0);
        }

        page.hline(page.left(), page.right(), page.cursor() - 1.0, 0.4, RGB_RULE);
        page.advance(8.0);
    }

    // (e) totals panel in three visual tiers
    fn draw_totals_panel(&self, page: &mut PageBuilder, data: &InvoiceDocumentData) {
        let totals = &data.totals;
        page.ensure_space(7.0 * ROW_HEIGHT + 10.0);

        let label_x = page.right() - 80.0;
        let value_x = page.right();

        // normal tier
        let tax_label = if totals.tax_rate > Decimal::ZERO {
            format!(
                "Tax ({}%)",
                (totals.tax_rate * Decimal::from(100)).normalize()
            )
        } else {
            "Tax".to_string()
        };
        let normal_rows = [
            ("Subtotal".to_string(), self.amount(totals.subtotal)),
            (
                "Discount".to_string(),
                format!("- {}", self.amount(totals.discount_amount)),
            ),
            (tax_label, self.amount(totals.tax_amount)),
            ("Paid".to_string(), self.amount(totals.paid)),
        ];

        for (label, value) in &normal_rows {
            let y = page.cursor() - ROW_HEIGHT;
            page.text(label, label_x, y, BODY_SIZE, RGB_MUTED);
            page.text_right(value, value_x, y, BODY_SIZE, false, RGB_TEXT);
            page.advance(ROW_HEIGHT);
        }

        // highlight tier
        page.hline(label_x, value_x, page.cursor() - 1.0, 0.4, RGB_RULE);
        page.advance(2.0);
        let y = page.cursor() - ROW_HEIGHT;
        page.text_bold("Amount Payable", label_x, y, 10.0, RGB_TEXT);
        page.text_right(
            &self.amount(totals.payable),
            value_x,
            y,
            10.0,
            true,
            RGB_TEXT,
        );
        page.advance(ROW_HEIGHT + 2.0);

        // total tier: balance due, emphasized
        let (balance_label, balance_value) = if totals.balance < Decimal::ZERO {
            ("Credit".to_string(), self.amount(-totals.balance))
        } else {
            ("Balance Due".to_string(), self.amount(totals.balance))
        };
        page.hline(label_x, value_x, page.cursor() - 0.5, 0.8, RGB_ACCENT);
        page.advance(2.0);
        let y = page.cursor() - HEADER_ROW_HEIGHT;
        page.text_bold(&balance_label, label_x, y, 12.0, RGB_ACCENT);
        page.text_right(&balance_value, value_x, y, 12.0, true, RGB_ACCENT);
        page.advance(HEADER_ROW_HEIGHT + 2.0);
    }

    // (f) footer disclaimer + generation timestamp. Never starts a page:
    // when the remaining space is too small it is pinned to a fixed
    // bottom offset and crowding is accepted.
    fn draw_footer(&self, page: &mut PageBuilder) {
        let y = if page.remaining() >= FOOTER_MIN_HEIGHT {
            FOOTER_BOTTOM_OFFSET.max(page.cursor() - FOOTER_MIN_HEIGHT)
        } else {
            FOOTER_BOTTOM_OFFSET
        };

        page.hline(page.left(), page.right(), y + 8.0, 0.3, RGB_RULE);
        page.text(
            "This is a system generated invoice and does not require a signature.",
            page.left(),
            y + 4.0,
            LABEL_SIZE,
            RGB_MUTED,
        );
        let generated = format!("Generated on {}", Utc::now().format("%d %b %Y %H:%M UTC"));
        page.text_right(&generated, page.right(), y + 4.0, LABEL_SIZE, false, RGB_MUTED);
    }

    // (g) optional narrative page; the one section that explicitly
    // requests a page break
    fn draw_narrative_page(&self, page: &mut PageBuilder, options: &ComposeOptions) {
        page.new_page();

        page.text_bold(
            "Clinical Summary",
            page.left(),
            page.cursor() - 6.0,
            14.0,
            RGB_ACCENT,
        );
        page.advance(10.0);
        page.hline(page.left(), page.right(), page.cursor(), 0.6, RGB_RULE);
        page.advance(6.0);

        for section in &options.narrative {
            page.ensure_space(3.0 * ROW_HEIGHT);
            page.text_bold(
                &section.title,
                page.left(),
                page.cursor() - ROW_HEIGHT,
                11.0,
                RGB_TEXT,
            );
            page.advance(ROW_HEIGHT + 2.0);

            for line in wrap_text(&section.body, page.content_width(), BODY_SIZE) {
                page.ensure_space(ROW_HEIGHT);
                page.text(&line, page.left(), page.cursor() - ROW_HEIGHT + 1.0, BODY_SIZE, RGB_TEXT);
                page.advance(ROW_HEIGHT - 1.0);
            }

            page.advance(4.0);
        }
    }
}
