//! Common resource ids
//!
//! Concrete id types shared by many resources. Each one declares its
//! segments in path order and copies parsed values into named fields.

use super::id::ResourceId;
use super::parser::ParseResult;
use super::segment::Segment;
use crate::error::ParseError;
use std::fmt;

fn subscription_prefix() -> Vec<Segment> {
    vec![
        Segment::static_segment("subscriptions"),
        Segment::subscription_id("subscriptionId"),
    ]
}

fn resource_group_prefix() -> Vec<Segment> {
    let mut segments = subscription_prefix();
    segments.push(Segment::static_segment("resourceGroups"));
    segments.push(Segment::resource_group("resourceGroupName"));
    segments
}

fn provider(namespace: &str) -> [Segment; 2] {
    [
        Segment::static_segment("providers"),
        Segment::resource_provider(namespace),
    ]
}

// =============================================================================
// Subscription
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SubscriptionId {
    pub subscription_id: String,
}

impl SubscriptionId {
    pub fn new(subscription_id: &str) -> Self {
        Self {
            subscription_id: subscription_id.to_string(),
        }
    }
}

impl ResourceId for SubscriptionId {
    const ID_TYPE: &'static str = "Subscription";

    fn segments() -> Vec<Segment> {
        subscription_prefix()
    }

    fn from_parse_result(result: &ParseResult) -> Result<Self, ParseError> {
        Ok(Self::new(result.get("subscriptionId")?))
    }

    fn field(&self, name: &str) -> Option<&str> {
        match name {
            "subscriptionId" => Some(&self.subscription_id),
            _ => None,
        }
    }
}

// =============================================================================
// Resource group
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceGroupId {
    pub subscription_id: String,
    pub resource_group_name: String,
}

impl ResourceGroupId {
    pub fn new(subscription_id: &str, resource_group_name: &str) -> Self {
        Self {
            subscription_id: subscription_id.to_string(),
            resource_group_name: resource_group_name.to_string(),
        }
    }
}

impl ResourceId for ResourceGroupId {
    const ID_TYPE: &'static str = "Resource Group";

    fn segments() -> Vec<Segment> {
        resource_group_prefix()
    }

    fn from_parse_result(result: &ParseResult) -> Result<Self, ParseError> {
        Ok(Self::new(
            result.get("subscriptionId")?,
            result.get("resourceGroupName")?,
        ))
    }

    fn field(&self, name: &str) -> Option<&str> {
        match name {
            "subscriptionId" => Some(&self.subscription_id),
            "resourceGroupName" => Some(&self.resource_group_name),
            _ => None,
        }
    }
}

// =============================================================================
// User assigned identity
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UserAssignedIdentityId {
    pub subscription_id: String,
    pub resource_group_name: String,
    pub user_assigned_identity_name: String,
}

impl UserAssignedIdentityId {
    pub fn new(subscription_id: &str, resource_group_name: &str, name: &str) -> Self {
        Self {
            subscription_id: subscription_id.to_string(),
            resource_group_name: resource_group_name.to_string(),
            user_assigned_identity_name: name.to_string(),
        }
    }
}

impl ResourceId for UserAssignedIdentityId {
    const ID_TYPE: &'static str = "User Assigned Identity";

    fn segments() -> Vec<Segment> {
        let mut segments = resource_group_prefix();
        segments.extend(provider("Microsoft.ManagedIdentity"));
        segments.push(Segment::static_segment("userAssignedIdentities"));
        segments.push(Segment::user_specified("userAssignedIdentityName"));
        segments
    }

    fn from_parse_result(result: &ParseResult) -> Result<Self, ParseError> {
        Ok(Self::new(
            result.get("subscriptionId")?,
            result.get("resourceGroupName")?,
            result.get("userAssignedIdentityName")?,
        ))
    }

    fn field(&self, name: &str) -> Option<&str> {
        match name {
            "subscriptionId" => Some(&self.subscription_id),
            "resourceGroupName" => Some(&self.resource_group_name),
            "userAssignedIdentityName" => Some(&self.user_assigned_identity_name),
            _ => None,
        }
    }
}

// =============================================================================
// Virtual network
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VirtualNetworkId {
    pub subscription_id: String,
    pub resource_group_name: String,
    pub virtual_network_name: String,
}

impl VirtualNetworkId {
    pub fn new(subscription_id: &str, resource_group_name: &str, virtual_network_name: &str) -> Self {
        Self {
            subscription_id: subscription_id.to_string(),
            resource_group_name: resource_group_name.to_string(),
            virtual_network_name: virtual_network_name.to_string(),
        }
    }

    /// Id of a subnet inside this network
    pub fn subnet(&self, subnet_name: &str) -> SubnetId {
        SubnetId::new(
            &self.subscription_id,
            &self.resource_group_name,
            &self.virtual_network_name,
            subnet_name,
        )
    }
}

impl ResourceId for VirtualNetworkId {
    const ID_TYPE: &'static str = "Virtual Network";

    fn segments() -> Vec<Segment> {
        let mut segments = resource_group_prefix();
        segments.extend(provider("Microsoft.Network"));
        segments.push(Segment::static_segment("virtualNetworks"));
        segments.push(Segment::user_specified("virtualNetworkName"));
        segments
    }

    fn from_parse_result(result: &ParseResult) -> Result<Self, ParseError> {
        Ok(Self::new(
            result.get("subscriptionId")?,
            result.get("resourceGroupName")?,
            result.get("virtualNetworkName")?,
        ))
    }

    fn field(&self, name: &str) -> Option<&str> {
        match name {
            "subscriptionId" => Some(&self.subscription_id),
            "resourceGroupName" => Some(&self.resource_group_name),
            "virtualNetworkName" => Some(&self.virtual_network_name),
            _ => None,
        }
    }
}

// =============================================================================
// Subnet
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SubnetId {
    pub subscription_id: String,
    pub resource_group_name: String,
    pub virtual_network_name: String,
    pub subnet_name: String,
}

impl SubnetId {
    pub fn new(
        subscription_id: &str,
        resource_group_name: &str,
        virtual_network_name: &str,
        subnet_name: &str,
    ) -> Self {
        Self {
            subscription_id: subscription_id.to_string(),
            resource_group_name: resource_group_name.to_string(),
            virtual_network_name: virtual_network_name.to_string(),
            subnet_name: subnet_name.to_string(),
        }
    }
}

impl ResourceId for SubnetId {
    const ID_TYPE: &'static str = "Subnet";

    fn segments() -> Vec<Segment> {
        let mut segments = resource_group_prefix();
        segments.extend(provider("Microsoft.Network"));
        segments.push(Segment::static_segment("virtualNetworks"));
        segments.push(Segment::user_specified("virtualNetworkName"));
        segments.push(Segment::static_segment("subnets"));
        segments.push(Segment::user_specified("subnetName"));
        segments
    }

    fn from_parse_result(result: &ParseResult) -> Result<Self, ParseError> {
        Ok(Self::new(
            result.get("subscriptionId")?,
            result.get("resourceGroupName")?,
            result.get("virtualNetworkName")?,
            result.get("subnetName")?,
        ))
    }

    fn field(&self, name: &str) -> Option<&str> {
        match name {
            "subscriptionId" => Some(&self.subscription_id),
            "resourceGroupName" => Some(&self.resource_group_name),
            "virtualNetworkName" => Some(&self.virtual_network_name),
            "subnetName" => Some(&self.subnet_name),
            _ => None,
        }
    }
}

// =============================================================================
// DNS record set
// =============================================================================

/// Record types accepted by the `recordType` segment
pub const DNS_RECORD_TYPES: &[&str] = &[
    "A", "AAAA", "CAA", "CNAME", "MX", "NS", "PTR", "SOA", "SRV", "TXT",
];

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RecordTypeId {
    pub subscription_id: String,
    pub resource_group_name: String,
    pub dns_zone_name: String,
    pub record_type: String,
    pub relative_record_set_name: String,
}

impl RecordTypeId {
    pub fn new(
        subscription_id: &str,
        resource_group_name: &str,
        dns_zone_name: &str,
        record_type: &str,
        relative_record_set_name: &str,
    ) -> Self {
        Self {
            subscription_id: subscription_id.to_string(),
            resource_group_name: resource_group_name.to_string(),
            dns_zone_name: dns_zone_name.to_string(),
            record_type: record_type.to_string(),
            relative_record_set_name: relative_record_set_name.to_string(),
        }
    }
}

impl ResourceId for RecordTypeId {
    const ID_TYPE: &'static str = "Record Type";

    fn segments() -> Vec<Segment> {
        let mut segments = resource_group_prefix();
        segments.extend(provider("Microsoft.Network"));
        segments.push(Segment::static_segment("dnsZones"));
        segments.push(Segment::user_specified("dnsZoneName"));
        segments.push(Segment::constant("recordType", DNS_RECORD_TYPES));
        segments.push(Segment::user_specified("relativeRecordSetName"));
        segments
    }

    fn from_parse_result(result: &ParseResult) -> Result<Self, ParseError> {
        Ok(Self::new(
            result.get("subscriptionId")?,
            result.get("resourceGroupName")?,
            result.get("dnsZoneName")?,
            result.get("recordType")?,
            result.get("relativeRecordSetName")?,
        ))
    }

    fn field(&self, name: &str) -> Option<&str> {
        match name {
            "subscriptionId" => Some(&self.subscription_id),
            "resourceGroupName" => Some(&self.resource_group_name),
            "dnsZoneName" => Some(&self.dns_zone_name),
            "recordType" => Some(&self.record_type),
            "relativeRecordSetName" => Some(&self.relative_record_set_name),
            _ => None,
        }
    }
}

// =============================================================================
// Scoped role assignment
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ScopedRoleAssignmentId {
    /// Any resource id, stored with its leading `/`
    pub scope: String,
    pub role_assignment_name: String,
}

impl ScopedRoleAssignmentId {
    pub fn new(scope: &str, role_assignment_name: &str) -> Self {
        Self {
            scope: scope.to_string(),
            role_assignment_name: role_assignment_name.to_string(),
        }
    }
}

impl ResourceId for ScopedRoleAssignmentId {
    const ID_TYPE: &'static str = "Scoped Role Assignment";

    fn segments() -> Vec<Segment> {
        let mut segments = vec![Segment::scope("scope")];
        segments.extend(provider("Microsoft.Authorization"));
        segments.push(Segment::static_segment("roleAssignments"));
        segments.push(Segment::user_specified("roleAssignmentName"));
        segments
    }

    fn from_parse_result(result: &ParseResult) -> Result<Self, ParseError> {
        Ok(Self::new(
            result.get("scope")?,
            result.get("roleAssignmentName")?,
        ))
    }

    fn field(&self, name: &str) -> Option<&str> {
        match name {
            "scope" => Some(&self.scope),
            "roleAssignmentName" => Some(&self.role_assignment_name),
            _ => None,
        }
    }
}

// =============================================================================
// Widget (Microsoft.Example)
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WidgetId {
    pub subscription_id: String,
    pub resource_group_name: String,
    pub widget_name: String,
}

impl WidgetId {
    pub fn new(subscription_id: &str, resource_group_name: &str, widget_name: &str) -> Self {
        Self {
            subscription_id: subscription_id.to_string(),
            resource_group_name: resource_group_name.to_string(),
            widget_name: widget_name.to_string(),
        }
    }
}

impl ResourceId for WidgetId {
    const ID_TYPE: &'static str = "Widget";

    fn segments() -> Vec<Segment> {
        let mut segments = resource_group_prefix();
        segments.extend(provider("Microsoft.Example"));
        segments.push(Segment::static_segment("widgets"));
        segments.push(Segment::user_specified("widgetName"));
        segments
    }

    fn from_parse_result(result: &ParseResult) -> Result<Self, ParseError> {
        Ok(Self::new(
            result.get("subscriptionId")?,
            result.get("resourceGroupName")?,
            result.get("widgetName")?,
        ))
    }

    fn field(&self, name: &str) -> Option<&str> {
        match name {
            "subscriptionId" => Some(&self.subscription_id),
            "resourceGroupName" => Some(&self.resource_group_name),
            "widgetName" => Some(&self.widget_name),
            _ => None,
        }
    }
}

macro_rules! display_via_describe {
    ($($ty:ty),* $(,)?) => {
        $(
            impl fmt::Display for $ty {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    f.write_str(&self.describe())
                }
            }
        )*
    };
}

display_via_describe!(
    SubscriptionId,
    ResourceGroupId,
    UserAssignedIdentityId,
    VirtualNetworkId,
    SubnetId,
    RecordTypeId,
    ScopedRoleAssignmentId,
    WidgetId,
);
