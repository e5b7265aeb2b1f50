use chrono::{DateTime, TimeZone, Utc};
use chrono_tz::Tz;

/// Renders one log panel line: `(HH:MM:SS) <message>\n`.
pub fn format_entry<Z: TimeZone>(at: &DateTime<Z>, message: &str) -> String
where
    Z::Offset: std::fmt::Display,
{
    format!("({}) {}\n", at.format("%H:%M:%S"), message)
}

/// Append-only text shown in the log panel.
pub struct Journal {
    zone: Tz,
    text: String,
    entries: usize,
}

impl Journal {
    pub fn new(zone: Tz) -> Self {
        Self {
            zone,
            text: String::new(),
            entries: 0,
        }
    }

    /// Stamps `message` with the current time in the journal's zone.
    pub fn append(&mut self, message: &str) {
        let now = Utc::now().with_timezone(&self.zone);
        self.append_at(&now, message);
    }

    pub fn append_at(&mut self, at: &DateTime<Tz>, message: &str) {
        self.text.push_str(&format_entry(at, message));
        self.entries += 1;
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn len(&self) -> usize {
        self.entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn israel_time(h: u32, m: u32, s: u32) -> DateTime<Tz> {
        let naive = NaiveDate::from_ymd_opt(2024, 1, 15)
            .unwrap()
            .and_hms_opt(h, m, s)
            .unwrap();
        chrono_tz::Israel.from_local_datetime(&naive).unwrap()
    }

    #[test]
    fn entry_has_fixed_shape() {
        let at = israel_time(9, 5, 7);
        assert_eq!(
            format_entry(&at, "Number of people detected: 3"),
            "(09:05:07) Number of people detected: 3\n"
        );
    }

    #[test]
    fn timestamp_uses_the_configured_zone() {
        // Israel Standard Time is UTC+2 in January
        let utc = Utc.with_ymd_and_hms(2024, 1, 15, 22, 30, 0).unwrap();
        let local = utc.with_timezone(&chrono_tz::Israel);

        assert_eq!(format_entry(&local, "x"), "(00:30:00) x\n");
    }

    #[test]
    fn journal_only_grows() {
        let mut journal = Journal::new(chrono_tz::Israel);
        assert_eq!(journal.len(), 0);

        journal.append_at(&israel_time(12, 0, 0), "Error: No camera detected.");
        journal.append_at(&israel_time(12, 0, 5), "Number of people detected: 0");

        assert_eq!(journal.len(), 2);
        assert_eq!(
            journal.as_str(),
            "(12:00:00) Error: No camera detected.\n(12:00:05) Number of people detected: 0\n"
        );
    }

    #[test]
    fn append_stamps_current_time() {
        let mut journal = Journal::new(chrono_tz::UTC);
        journal.append("Number of people detected: 1");

        let line = journal.as_str();
        assert!(line.starts_with('('));
        assert_eq!(&line[9..11], ") ");
        assert!(line.ends_with("Number of people detected: 1\n"));
    }
}
