use crate::domain::early_access::EarlyAccessEntry;
use crate::error::Result;
use std::io::Write;

/// Writes early-access entries as CSV with an `email,createdAt,ipAddress,userAgent` header.
pub struct EntryWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> EntryWriter<W> {
    pub fn new(sink: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(sink),
        }
    }

    /// Writes every entry and flushes. An empty list still produces the header.
    pub fn write_entries(&mut self, entries: &[EarlyAccessEntry]) -> Result<()> {
        self.writer
            .write_record(["email", "createdAt", "ipAddress", "userAgent"])?;
        for entry in entries {
            let created_at = entry.created_at.to_rfc3339();
            self.writer.write_record([
                entry.email.as_str(),
                created_at.as_str(),
                entry.ip_address.as_deref().unwrap_or(""),
                entry.user_agent.as_deref().unwrap_or(""),
            ])?;
        }
        self.writer.flush()?;
        Ok(())
    }
}
