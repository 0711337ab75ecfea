//! The canonical output schema and the declarative field-mapping table.
//!
//! Every output row carries exactly the fields in [`CANONICAL_FIELDS`], in
//! that order, regardless of what the source shipped. The mapping table ties
//! each canonical field to its source payload key and the transform applied
//! to the raw value.

/// How a raw source value becomes a canonical one.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Transform {
    /// Trimmed, whitespace-collapsed string.
    Trim,
    /// Source-language affirmative/negative markers to "Yes"/"No".
    Boolean,
    /// Payment-period phrase to payments per year.
    CouponFrequency,
    /// Source timestamps and dotted dates to `YYYY-MM-DD`.
    Date,
    /// Free-text payment schedule; also derives "First Payment Date".
    InterestDates,
}

/// One row of the mapping table.
pub struct FieldSpec {
    pub canonical: &'static str,
    pub source: &'static str,
    pub transform: Transform,
}

/// Derived field filled by the `InterestDates` transform, not mapped directly.
pub const FIRST_PAYMENT_DATE: &str = "First Payment Date";

/// Canonical output columns, in emission order.
pub const CANONICAL_FIELDS: &[&str] = &[
    "Security Symbol",
    "ISIN",
    "Full Name Issuer",
    "Registration Number",
    "Security Category",
    "Security Identification Code",
    "CFI code assigned to the securities",
    "CFI code as of the listing decision date",
    "Series Number",
    "Face Value",
    "Face Value Currency",
    "Issue Size, pcs",
    "Issue Date",
    "Coupon",
    "Maturity Date",
    "Coupon Frequency",
    "Interest Payment Dates",
    "Current Coupon Information (calculation method)",
    "Redemption Amount",
    "Early Redemption Option",
    "Listing Section",
    "Decision date to include in the List",
    "Listing Inclusion Date",
    "Listing Exchange",
    "Start Date Organized Trading",
    "Available Trading Modes",
    "Instrument Group",
    "Lot Size",
    "Price Tick",
    "Price Quotation Units",
    "Settlement Currency",
    "Trading Restrictions (incl. qualified investors)",
    "Included in the exchange index universe",
    "Country Incorporation",
    "Issuer TIN",
    "Legal Address",
    "Information Issuer Default Events",
    "Information Issuer Technical Default Events",
    "Issuer's Investor Relations Website",
    "Foreign Exchange Disclosure Page",
    "Competent Authority/OAM Disclosure Page",
    "Annual Reports Disclosed Issuer",
    FIRST_PAYMENT_DATE,
];

const ISIN_IDX: usize = 1;
const ISSUER_IDX: usize = 2;

/// Mapping table: canonical field to source payload key and transform.
/// `First Payment Date` is absent on purpose; it is derived by the
/// `InterestDates` transform.
pub const FIELD_SPECS: &[FieldSpec] = &[
    FieldSpec { canonical: "Security Symbol", source: "srtsCode", transform: Transform::Trim },
    FieldSpec { canonical: "ISIN", source: "sisinCode", transform: Transform::Trim },
    FieldSpec { canonical: "Full Name Issuer", source: "fullName", transform: Transform::Trim },
    FieldSpec { canonical: "Registration Number", source: "siGosRegNum", transform: Transform::Trim },
    FieldSpec { canonical: "Security Category", source: "securityCategory", transform: Transform::Trim },
    FieldSpec { canonical: "Security Identification Code", source: "srtsCode", transform: Transform::Trim },
    FieldSpec { canonical: "CFI code assigned to the securities", source: "scfiCurrent", transform: Transform::Trim },
    FieldSpec { canonical: "CFI code as of the listing decision date", source: "scfiListing", transform: Transform::Trim },
    FieldSpec { canonical: "Series Number", source: "sseriesNum", transform: Transform::Trim },
    FieldSpec { canonical: "Face Value", source: "sfaceValue", transform: Transform::Trim },
    FieldSpec { canonical: "Face Value Currency", source: "classCurrency", transform: Transform::Trim },
    FieldSpec { canonical: "Issue Size, pcs", source: "sissueSize", transform: Transform::Trim },
    FieldSpec { canonical: "Issue Date", source: "sissueDate", transform: Transform::Date },
    FieldSpec { canonical: "Coupon", source: "scouponRate", transform: Transform::Trim },
    FieldSpec { canonical: "Maturity Date", source: "smaturityDate", transform: Transform::Date },
    FieldSpec { canonical: "Coupon Frequency", source: "scouponPeriod", transform: Transform::CouponFrequency },
    FieldSpec { canonical: "Interest Payment Dates", source: "sinterestPayDates", transform: Transform::InterestDates },
    FieldSpec { canonical: "Current Coupon Information (calculation method)", source: "scouponInfo", transform: Transform::Trim },
    FieldSpec { canonical: "Redemption Amount", source: "sredemptionAmount", transform: Transform::Trim },
    FieldSpec { canonical: "Early Redemption Option", source: "searlyRedemption", transform: Transform::Boolean },
    FieldSpec { canonical: "Listing Section", source: "slevelName", transform: Transform::Trim },
    FieldSpec { canonical: "Decision date to include in the List", source: "sdecisionListDate", transform: Transform::Date },
    FieldSpec { canonical: "Listing Inclusion Date", source: "squotListInDate", transform: Transform::Date },
    FieldSpec { canonical: "Listing Exchange", source: "slistingExchange", transform: Transform::Trim },
    FieldSpec { canonical: "Start Date Organized Trading", source: "stradeStartDate", transform: Transform::Date },
    FieldSpec { canonical: "Available Trading Modes", source: "stradeModes", transform: Transform::Trim },
    FieldSpec { canonical: "Instrument Group", source: "sinstrumentGroup", transform: Transform::Trim },
    FieldSpec { canonical: "Lot Size", source: "slotSize", transform: Transform::Trim },
    FieldSpec { canonical: "Price Tick", source: "spriceStep", transform: Transform::Trim },
    FieldSpec { canonical: "Price Quotation Units", source: "spriceCurrency", transform: Transform::Trim },
    FieldSpec { canonical: "Settlement Currency", source: "ssettleCurrency", transform: Transform::Trim },
    FieldSpec { canonical: "Trading Restrictions (incl. qualified investors)", source: "sisQualified", transform: Transform::Boolean },
    FieldSpec { canonical: "Included in the exchange index universe", source: "sinIndexBase", transform: Transform::Boolean },
    FieldSpec { canonical: "Country Incorporation", source: "scountryName", transform: Transform::Trim },
    FieldSpec { canonical: "Issuer TIN", source: "einnCode", transform: Transform::Trim },
    FieldSpec { canonical: "Legal Address", source: "slegalAddress", transform: Transform::Trim },
    FieldSpec { canonical: "Information Issuer Default Events", source: "sdateDefolt", transform: Transform::Trim },
    FieldSpec { canonical: "Information Issuer Technical Default Events", source: "sdateTechnicDefolt", transform: Transform::Trim },
    FieldSpec { canonical: "Issuer's Investor Relations Website", source: "sdisclosureSite", transform: Transform::Trim },
    FieldSpec { canonical: "Foreign Exchange Disclosure Page", source: "sforeignDisclosureSite", transform: Transform::Trim },
    FieldSpec { canonical: "Competent Authority/OAM Disclosure Page", source: "soamDisclosureSite", transform: Transform::Trim },
    FieldSpec { canonical: "Annual Reports Disclosed Issuer", source: "sannualReports", transform: Transform::Trim },
];

pub(crate) fn field_index(canonical: &str) -> Option<usize> {
    CANONICAL_FIELDS.iter().position(|f| *f == canonical)
}

/// One normalized output row. Values sit in [`CANONICAL_FIELDS`] order and
/// every field is present, possibly as an empty string.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BondRecord {
    values: Vec<String>,
}

impl BondRecord {
    pub(crate) fn empty() -> Self {
        Self {
            values: vec![String::new(); CANONICAL_FIELDS.len()],
        }
    }

    pub fn get(&self, canonical: &str) -> Option<&str> {
        field_index(canonical).map(|i| self.values[i].as_str())
    }

    pub(crate) fn set(&mut self, canonical: &str, value: String) {
        if let Some(i) = field_index(canonical) {
            self.values[i] = value;
        }
    }

    pub fn isin(&self) -> &str {
        &self.values[ISIN_IDX]
    }

    pub fn issuer(&self) -> &str {
        &self.values[ISSUER_IDX]
    }

    /// Values in canonical column order, for the CSV writer.
    pub fn values(&self) -> impl Iterator<Item = &str> {
        self.values.iter().map(String::as_str)
    }
}
