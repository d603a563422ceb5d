//! What a lead looks like to the operator chat and to the spreadsheet.

use {
    buran_channels::SheetRow,
    buran_common::escape_html,
    chrono::{DateTime, Utc},
    chrono_tz::Asia::Tashkent,
};

use crate::model::Lead;

/// Shown in place of an empty country.
pub const UNSPECIFIED_COUNTRY: &str = "Belgilanmagan";

/// Spreadsheet timestamps are Tashkent wall-clock time.
const SHEET_TIMESTAMP_FORMAT: &str = "%d.%m.%Y, %H:%M:%S";

/// HTML notification posted to the operator chat for a new lead.
pub fn lead_notification(lead: &Lead) -> String {
    let country = if lead.country.is_empty() {
        UNSPECIFIED_COUNTRY
    } else {
        lead.country.as_str()
    };
    format!(
        "📋 Yangi ariza!\n\n👤 Ism: {}\n📞 Telefon: {}\n🌍 Davlat: {}\n📝 Forma: {}",
        escape_html(&lead.name),
        escape_html(&lead.phone),
        escape_html(country),
        escape_html(&lead.form_type),
    )
}

/// Spreadsheet row for a lead submitted at `at`.
pub fn sheet_row(lead: &Lead, at: DateTime<Utc>) -> SheetRow {
    SheetRow {
        name: lead.name.clone(),
        phone: lead.phone.clone(),
        country: lead.country.clone(),
        form_type: lead.form_type.clone(),
        timestamp: at
            .with_timezone(&Tashkent)
            .format(SHEET_TIMESTAMP_FORMAT)
            .to_string(),
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::model::{DEFAULT_FORM_TYPE, LeadStatus},
        chrono::TimeZone,
    };

    fn lead(country: &str) -> Lead {
        Lead {
            id: 1,
            name: "Aziz <Karimov>".into(),
            phone: "+998 90 123 45 67".into(),
            country: country.into(),
            form_type: DEFAULT_FORM_TYPE.into(),
            status: LeadStatus::New,
            created_at: 0,
        }
    }

    #[test]
    fn notification_escapes_and_defaults_country() {
        assert_eq!(
            lead_notification(&lead("")),
            "📋 Yangi ariza!\n\n👤 Ism: Aziz &lt;Karimov&gt;\n📞 Telefon: +998 90 123 45 67\n🌍 Davlat: Belgilanmagan\n📝 Forma: Website Form"
        );
        assert!(lead_notification(&lead("Janubiy Koreya")).contains("🌍 Davlat: Janubiy Koreya\n"));
    }

    #[test]
    fn sheet_timestamp_is_tashkent_local_time() {
        let at = Utc.with_ymd_and_hms(2026, 3, 1, 21, 30, 5).unwrap();
        let row = sheet_row(&lead("Germaniya"), at);
        // UTC+5, crosses midnight.
        assert_eq!(row.timestamp, "02.03.2026, 02:30:05");
        assert_eq!(row.country, "Germaniya");
        assert_eq!(row.form_type, "Website Form");
    }
}
