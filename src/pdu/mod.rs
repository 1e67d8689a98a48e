//! Protocol-header template construction.
//!
//! A [`PduHeader`] is the fixed-field template a client session builds once
//! from its peer's descriptor and hands to the (out-of-scope) PDU layer,
//! which fills the per-PDU fields and encodes the wire format. Building a
//! template is a pure function of the descriptor and the local id.

use crate::core::{ENTITY_ID_LENGTH, PROTOCOL_VERSION, SEQUENCE_NUMBER_LENGTH};
use crate::mib::RemoteEntity;

/// Direction a PDU travels in, relative to the file being delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// From the sending entity toward the file receiver.
    TowardReceiver,
    /// From the receiving entity back toward the file sender.
    TowardSender,
}

/// Fixed-field CFDP header template for one peer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PduHeader {
    /// Protocol version, always [`PROTOCOL_VERSION`].
    pub version: u8,
    /// Travel direction; templates start toward the receiver.
    pub direction: Direction,
    /// Raw transmission mode copied from the peer descriptor.
    pub transmission_mode: u8,
    /// Whether PDUs to this peer carry a CRC.
    pub crc_required: bool,
    /// Byte length of entity ids in the encoded header.
    pub length_of_entity_ids: u8,
    /// Byte length of the transaction sequence number.
    pub length_of_sequence_number: u8,
    /// The local entity's id.
    pub source_entity_id: u32,
    /// The peer entity's id.
    pub destination_entity_id: u32,
    /// Sequence number; zero in a template, set per transaction.
    pub transaction_sequence_number: u32,
    /// Data field length; zero in a template, set per PDU.
    pub pdu_data_field_length: u16,
}

impl PduHeader {
    /// Build a header template from a peer descriptor and the local id.
    pub fn from_mib(peer: &RemoteEntity, local_id: u32) -> Self {
        Self {
            version: PROTOCOL_VERSION,
            direction: Direction::TowardReceiver,
            transmission_mode: peer.default_transmission_mode,
            crc_required: peer.crc_required != 0,
            length_of_entity_ids: ENTITY_ID_LENGTH,
            length_of_sequence_number: SEQUENCE_NUMBER_LENGTH,
            source_entity_id: local_id,
            destination_entity_id: peer.cfdp_id,
            transaction_sequence_number: 0,
            pdu_data_field_length: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_template_copies_descriptor_fields() {
        let mut peer = RemoteEntity::bootstrap_defaults();
        peer.cfdp_id = 9;
        peer.crc_required = 1;
        peer.default_transmission_mode = 0;

        let header = PduHeader::from_mib(&peer, 7);
        assert_eq!(header.version, PROTOCOL_VERSION);
        assert_eq!(header.source_entity_id, 7);
        assert_eq!(header.destination_entity_id, 9);
        assert_eq!(header.transmission_mode, 0);
        assert!(header.crc_required);
        assert_eq!(header.direction, Direction::TowardReceiver);
    }

    #[test]
    fn test_template_per_pdu_fields_start_zeroed() {
        let header = PduHeader::from_mib(&RemoteEntity::bootstrap_defaults(), 1);
        assert_eq!(header.transaction_sequence_number, 0);
        assert_eq!(header.pdu_data_field_length, 0);
    }
}
