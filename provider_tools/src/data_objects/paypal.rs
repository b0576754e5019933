use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize)]
pub struct AccessToken {
    pub access_token: String,
    #[serde(default)]
    pub expires_in: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PayPalAmount {
    pub currency_code: String,
    /// Decimal string with two places, e.g. `"55.99"`
    pub value: String,
}

#[derive(Debug, Clone)]
pub struct NewPayPalOrder {
    pub amount: PayPalAmount,
    pub description: String,
    /// Our order id. PayPal echoes it back on capture.
    pub custom_id: String,
    pub return_url: String,
    pub cancel_url: String,
}

impl NewPayPalOrder {
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "intent": "CAPTURE",
            "purchase_units": [{
                "reference_id": self.custom_id,
                "custom_id": self.custom_id,
                "description": self.description,
                "amount": self.amount,
            }],
            "application_context": {
                "return_url": self.return_url,
                "cancel_url": self.cancel_url,
            },
        })
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Link {
    pub href: String,
    pub rel: String,
    pub method: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PayPalOrder {
    pub id: String,
    pub status: String,
    #[serde(default)]
    pub links: Vec<Link>,
}

impl PayPalOrder {
    /// Where to send the buyer to approve the payment.
    pub fn approve_url(&self) -> Option<&str> {
        self.links.iter().find(|l| l.rel == "approve" || l.rel == "payer-action").map(|l| l.href.as_str())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PayerName {
    pub given_name: Option<String>,
    pub surname: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Payer {
    pub email_address: Option<String>,
    pub name: Option<PayerName>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FullName {
    pub full_name: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PayPalAddress {
    pub address_line_1: Option<String>,
    pub address_line_2: Option<String>,
    /// City or town
    pub admin_area_2: Option<String>,
    /// County or state
    pub admin_area_1: Option<String>,
    pub postal_code: Option<String>,
    pub country_code: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PayPalShipping {
    pub name: Option<FullName>,
    pub address: Option<PayPalAddress>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CaptureDetail {
    pub id: String,
    pub status: String,
    pub custom_id: Option<String>,
    pub amount: Option<PayPalAmount>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Payments {
    #[serde(default)]
    pub captures: Vec<CaptureDetail>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PurchaseUnit {
    pub reference_id: Option<String>,
    pub custom_id: Option<String>,
    pub shipping: Option<PayPalShipping>,
    pub payments: Option<Payments>,
}

impl PurchaseUnit {
    fn first_capture(&self) -> Option<&CaptureDetail> {
        self.payments.as_ref().and_then(|p| p.captures.first())
    }
}

/// The response to `POST /v2/checkout/orders/{id}/capture` with `Prefer: return=representation`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PayPalCapture {
    pub id: String,
    pub status: String,
    pub payer: Option<Payer>,
    #[serde(default)]
    pub purchase_units: Vec<PurchaseUnit>,
}

impl PayPalCapture {
    pub fn is_completed(&self) -> bool {
        self.status == "COMPLETED"
    }

    /// Our order id, from whichever place PayPal chose to echo it.
    pub fn custom_id(&self) -> Option<&str> {
        let unit = self.purchase_units.first()?;
        unit.custom_id
            .as_deref()
            .or_else(|| unit.first_capture().and_then(|c| c.custom_id.as_deref()))
            .or(unit.reference_id.as_deref())
            .filter(|s| !s.is_empty() && *s != "default")
    }

    pub fn capture_id(&self) -> Option<&str> {
        self.purchase_units.first().and_then(PurchaseUnit::first_capture).map(|c| c.id.as_str())
    }

    pub fn payer_email(&self) -> Option<&str> {
        self.payer.as_ref().and_then(|p| p.email_address.as_deref())
    }

    pub fn payer_name(&self) -> Option<String> {
        let name = self.payer.as_ref()?.name.as_ref()?;
        let parts = [name.given_name.as_deref(), name.surname.as_deref()];
        let full = parts.iter().flatten().copied().collect::<Vec<_>>().join(" ");
        Some(full).filter(|s| !s.is_empty())
    }

    pub fn shipping(&self) -> Option<&PayPalShipping> {
        self.purchase_units.first().and_then(|u| u.shipping.as_ref())
    }
}
