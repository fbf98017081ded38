use std::sync::Arc;

use trivia_core::model::{Packet, PacketSelection, Question};

use crate::error::FetchError;
use crate::source::PacketSource;

/// Packet lookups by set name and packet number.
///
/// A blank set name means "no set selected" and yields an empty result
/// without touching the network.
#[derive(Clone)]
pub struct PacketService {
    source: Arc<dyn PacketSource>,
}

impl PacketService {
    #[must_use]
    pub fn new(source: Arc<dyn PacketSource>) -> Self {
        Self { source }
    }

    /// Fetch both tossups and bonuses of one packet.
    ///
    /// # Errors
    ///
    /// Returns `FetchError` if the request fails.
    pub async fn packet(&self, set_name: &str, packet_number: u32) -> Result<Packet, FetchError> {
        if set_name.is_empty() {
            return Ok(Packet::empty());
        }
        self.source.packet(set_name, packet_number).await
    }

    /// # Errors
    ///
    /// Returns `FetchError` if the request fails.
    pub async fn tossups(
        &self,
        set_name: &str,
        packet_number: u32,
    ) -> Result<Vec<Question>, FetchError> {
        if set_name.is_empty() {
            return Ok(Vec::new());
        }
        self.source.packet_tossups(set_name, packet_number).await
    }

    /// # Errors
    ///
    /// Returns `FetchError` if the request fails.
    pub async fn bonuses(
        &self,
        set_name: &str,
        packet_number: u32,
    ) -> Result<Vec<Question>, FetchError> {
        if set_name.is_empty() {
            return Ok(Vec::new());
        }
        self.source.packet_bonuses(set_name, packet_number).await
    }

    /// Fetch every packet of a selection, in selection order.
    ///
    /// # Errors
    ///
    /// Returns the first `FetchError` encountered.
    pub async fn load_selection(
        &self,
        selection: &PacketSelection,
    ) -> Result<Vec<(u32, Packet)>, FetchError> {
        let mut packets = Vec::with_capacity(selection.packets().len());
        for &number in selection.packets().as_slice() {
            log::debug!("loading {} packet {number}", selection.set_name());
            let packet = self.packet(selection.set_name(), number).await?;
            packets.push((number, packet));
        }
        Ok(packets)
    }
}
