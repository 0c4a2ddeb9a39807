//! Core types for the cost-source contract.
//!
//! Message shapes carry enough structure for the conformance suite to
//! validate behaviour, nothing more.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A named remote method of the cost-source contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Method {
    /// Plugin identification.
    Name,
    /// Resource support query.
    Supports,
    /// Historical cost records.
    GetActualCost,
    /// Forward-looking cost estimate for an existing resource.
    GetProjectedCost,
    /// Pricing specification lookup.
    GetPricingSpec,
    /// Cost estimate for a resource that does not exist yet.
    EstimateCost,
    /// Paginated cost-saving recommendations (optional).
    GetRecommendations,
}

impl Method {
    /// Every contract method, in declaration order.
    pub const ALL: [Self; 7] = [
        Self::Name,
        Self::Supports,
        Self::GetActualCost,
        Self::GetProjectedCost,
        Self::GetPricingSpec,
        Self::EstimateCost,
        Self::GetRecommendations,
    ];

    /// Returns the wire name of the method.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Name => "Name",
            Self::Supports => "Supports",
            Self::GetActualCost => "GetActualCost",
            Self::GetProjectedCost => "GetProjectedCost",
            Self::GetPricingSpec => "GetPricingSpec",
            Self::EstimateCost => "EstimateCost",
            Self::GetRecommendations => "GetRecommendations",
        }
    }

    /// Returns the capability that gates this method, if any.
    ///
    /// `Name` and `Supports` are always present.
    #[must_use]
    pub const fn capability(&self) -> Option<Capability> {
        match self {
            Self::Name | Self::Supports => None,
            Self::GetActualCost => Some(Capability::ActualCost),
            Self::GetProjectedCost => Some(Capability::ProjectedCost),
            Self::GetPricingSpec => Some(Capability::PricingSpec),
            Self::EstimateCost => Some(Capability::Estimate),
            Self::GetRecommendations => Some(Capability::Recommendations),
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown method name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown method: {0}")]
pub struct UnknownMethod(pub String);

impl FromStr for Method {
    type Err = UnknownMethod;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| UnknownMethod(s.to_string()))
    }
}

/// An optional method group a plugin may or may not implement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Capability {
    /// `GetActualCost`.
    ActualCost,
    /// `GetProjectedCost`.
    ProjectedCost,
    /// `GetPricingSpec`.
    PricingSpec,
    /// `EstimateCost`.
    Estimate,
    /// `GetRecommendations`.
    Recommendations,
}

impl Capability {
    /// Every capability, in declaration order.
    pub const ALL: [Self; 5] = [
        Self::ActualCost,
        Self::ProjectedCost,
        Self::PricingSpec,
        Self::Estimate,
        Self::Recommendations,
    ];

    const fn bit(self) -> u8 {
        1 << (self as u8)
    }
}

/// A set of capabilities, stored as a bitmask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct CapabilitySet(u8);

impl CapabilitySet {
    /// The empty set.
    #[must_use]
    pub const fn empty() -> Self {
        Self(0)
    }

    /// Every capability.
    #[must_use]
    pub const fn all() -> Self {
        Self::empty()
            .with(Capability::ActualCost)
            .with(Capability::ProjectedCost)
            .with(Capability::PricingSpec)
            .with(Capability::Estimate)
            .with(Capability::Recommendations)
    }

    /// The capabilities every certified plugin must provide.
    #[must_use]
    pub const fn required() -> Self {
        Self::all().without(Capability::Recommendations)
    }

    /// Returns a copy with `cap` added.
    #[must_use]
    pub const fn with(self, cap: Capability) -> Self {
        Self(self.0 | cap.bit())
    }

    /// Returns a copy with `cap` removed.
    #[must_use]
    pub const fn without(self, cap: Capability) -> Self {
        Self(self.0 & !cap.bit())
    }

    /// Returns true if `cap` is in the set.
    #[must_use]
    pub const fn contains(&self, cap: Capability) -> bool {
        self.0 & cap.bit() != 0
    }

    /// Returns true if the set is empty.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Iterates the capabilities in the set.
    pub fn iter(&self) -> impl Iterator<Item = Capability> + '_ {
        Capability::ALL.into_iter().filter(|c| self.contains(*c))
    }
}

impl FromIterator<Capability> for CapabilitySet {
    fn from_iter<I: IntoIterator<Item = Capability>>(iter: I) -> Self {
        iter.into_iter().fold(Self::empty(), Self::with)
    }
}

/// Describes a cloud resource being priced.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ResourceDescriptor {
    /// Cloud provider (e.g. "aws").
    pub provider: String,
    /// Resource type (e.g. "aws:ec2:Instance").
    pub resource_type: String,
    /// Provider SKU or instance size.
    pub sku: String,
    /// Deployment region.
    pub region: String,
    /// Free-form tags.
    #[serde(default)]
    pub tags: BTreeMap<String, String>,
}

impl ResourceDescriptor {
    /// Creates a descriptor with the required fields.
    #[must_use]
    pub fn new(
        provider: impl Into<String>,
        resource_type: impl Into<String>,
        sku: impl Into<String>,
        region: impl Into<String>,
    ) -> Self {
        Self {
            provider: provider.into(),
            resource_type: resource_type.into(),
            sku: sku.into(),
            region: region.into(),
            tags: BTreeMap::new(),
        }
    }
}

/// Response to `Name`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameResponse {
    /// Plugin name.
    pub name: String,
}

/// Request for `Supports`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupportsRequest {
    /// Resource to check.
    pub resource: ResourceDescriptor,
}

/// Response to `Supports`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupportsResponse {
    /// Whether the plugin can price the resource.
    pub supported: bool,
    /// Explanation when unsupported.
    #[serde(default)]
    pub reason: Option<String>,
}

/// Request for `GetActualCost`. Times are Unix seconds, `start` inclusive,
/// `end` exclusive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActualCostRequest {
    /// Provider resource identifier.
    pub resource_id: String,
    /// Range start.
    pub start: u64,
    /// Range end.
    pub end: u64,
}

/// A single historical cost observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostRecord {
    /// Observation time (Unix seconds).
    pub timestamp: u64,
    /// Cost in the response currency.
    pub cost: f64,
    /// Usage quantity.
    pub usage_amount: f64,
    /// Usage unit (e.g. "hour").
    pub usage_unit: String,
    /// Data source label.
    pub source: String,
}

/// Response to `GetActualCost`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActualCostResponse {
    /// Records ordered by timestamp.
    pub results: Vec<CostRecord>,
}

/// Request for `GetProjectedCost`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectedCostRequest {
    /// Resource to project.
    pub resource: ResourceDescriptor,
}

/// Response to `GetProjectedCost`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectedCostResponse {
    /// Price per billing unit.
    pub unit_price: f64,
    /// ISO 4217 currency code.
    pub currency: String,
    /// Projected monthly cost.
    pub cost_per_month: f64,
    /// Human-readable billing explanation.
    pub billing_detail: String,
}

/// Request for `GetPricingSpec`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingSpecRequest {
    /// Resource to look up.
    pub resource: ResourceDescriptor,
}

/// Pricing details for one resource SKU.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricingSpec {
    /// Cloud provider.
    pub provider: String,
    /// Resource type.
    pub resource_type: String,
    /// SKU.
    pub sku: String,
    /// Region.
    pub region: String,
    /// Billing mode (e.g. "per_hour").
    pub billing_mode: String,
    /// Rate per billing unit.
    pub rate_per_unit: f64,
    /// ISO 4217 currency code.
    pub currency: String,
}

/// Response to `GetPricingSpec`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricingSpecResponse {
    /// The pricing specification.
    pub spec: PricingSpec,
}

/// Request for `EstimateCost`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EstimateCostRequest {
    /// Resource type to estimate.
    pub resource_type: String,
    /// Resource attributes relevant to pricing.
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
}

/// Response to `EstimateCost`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EstimateCostResponse {
    /// ISO 4217 currency code.
    pub currency: String,
    /// Estimated monthly cost.
    pub cost_monthly: f64,
}

/// Request for `GetRecommendations`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RecommendationsRequest {
    /// Maximum items per page; zero lets the plugin choose.
    pub page_size: u32,
    /// Opaque continuation token; empty for the first page.
    #[serde(default)]
    pub page_token: String,
}

/// A single cost-saving recommendation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    /// Stable recommendation identifier.
    pub id: String,
    /// Target resource.
    pub resource_id: String,
    /// Suggested action (e.g. "rightsize").
    pub action: String,
    /// Estimated monthly savings.
    pub estimated_savings: f64,
    /// ISO 4217 currency code.
    pub currency: String,
}

/// Response to `GetRecommendations`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationsResponse {
    /// The page of recommendations.
    pub recommendations: Vec<Recommendation>,
    /// Token for the next page; empty when exhausted.
    pub next_page_token: String,
}

/// A request for any contract method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    /// `Name`.
    Name,
    /// `Supports`.
    Supports(SupportsRequest),
    /// `GetActualCost`.
    GetActualCost(ActualCostRequest),
    /// `GetProjectedCost`.
    GetProjectedCost(ProjectedCostRequest),
    /// `GetPricingSpec`.
    GetPricingSpec(PricingSpecRequest),
    /// `EstimateCost`.
    EstimateCost(EstimateCostRequest),
    /// `GetRecommendations`.
    GetRecommendations(RecommendationsRequest),
}

impl Request {
    /// Returns the method this request targets.
    #[must_use]
    pub const fn method(&self) -> Method {
        match self {
            Self::Name => Method::Name,
            Self::Supports(_) => Method::Supports,
            Self::GetActualCost(_) => Method::GetActualCost,
            Self::GetProjectedCost(_) => Method::GetProjectedCost,
            Self::GetPricingSpec(_) => Method::GetPricingSpec,
            Self::EstimateCost(_) => Method::EstimateCost,
            Self::GetRecommendations(_) => Method::GetRecommendations,
        }
    }
}

/// A response from any contract method.
#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    /// `Name`.
    Name(NameResponse),
    /// `Supports`.
    Supports(SupportsResponse),
    /// `GetActualCost`.
    GetActualCost(ActualCostResponse),
    /// `GetProjectedCost`.
    GetProjectedCost(ProjectedCostResponse),
    /// `GetPricingSpec`.
    GetPricingSpec(PricingSpecResponse),
    /// `EstimateCost`.
    EstimateCost(EstimateCostResponse),
    /// `GetRecommendations`.
    GetRecommendations(RecommendationsResponse),
}

impl Response {
    /// Returns the method this response answers.
    #[must_use]
    pub const fn method(&self) -> Method {
        match self {
            Self::Name(_) => Method::Name,
            Self::Supports(_) => Method::Supports,
            Self::GetActualCost(_) => Method::GetActualCost,
            Self::GetProjectedCost(_) => Method::GetProjectedCost,
            Self::GetPricingSpec(_) => Method::GetPricingSpec,
            Self::EstimateCost(_) => Method::EstimateCost,
            Self::GetRecommendations(_) => Method::GetRecommendations,
        }
    }
}
