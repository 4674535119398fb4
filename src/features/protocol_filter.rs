//! Protocol filter
//!
//! Keeps only the transactions that touch the target contract.

use crate::types::Transaction;

/// Check whether a transaction touches the given contract (case-insensitive)
pub fn touches_contract(tx: &Transaction, contract: &str) -> bool {
    tx.to.eq_ignore_ascii_case(contract) || tx.from.eq_ignore_ascii_case(contract)
}

/// Return the transactions whose `to` or `from` is the target contract, in input order
pub fn filter_protocol_transactions(transactions: &[Transaction], contract: &str) -> Vec<Transaction> {
    transactions
        .iter()
        .filter(|tx| touches_contract(tx, contract))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const COMPTROLLER: &str = "0x3d9819210A31b4961b30EF54bE2aeD79B9c9Cd3B";

    fn tx(hash: &str, from: &str, to: &str) -> Transaction {
        Transaction {
            hash: hash.to_string(),
            block_number: 1,
            from: from.to_string(),
            to: to.to_string(),
            value: 0,
            timestamp: 0,
            is_error: false,
        }
    }

    #[test]
    fn test_matches_either_direction_case_insensitive() {
        let txs = vec![
            tx("a", "0xwallet", &COMPTROLLER.to_lowercase()),
            tx("b", "0xwallet", "0xother"),
            tx("c", &COMPTROLLER.to_uppercase().replace("0X", "0x"), "0xwallet"),
            tx("d", "0xother", ""),
        ];

        let filtered = filter_protocol_transactions(&txs, COMPTROLLER);
        let hashes: Vec<&str> = filtered.iter().map(|t| t.hash.as_str()).collect();
        assert_eq!(hashes, vec!["a", "c"]);
    }

    #[test]
    fn test_preserves_order() {
        let txs = vec![
            tx("3", COMPTROLLER, "0xw"),
            tx("1", "0xw", COMPTROLLER),
            tx("2", "0xw", COMPTROLLER),
        ];
        let filtered = filter_protocol_transactions(&txs, COMPTROLLER);
        let hashes: Vec<&str> = filtered.iter().map(|t| t.hash.as_str()).collect();
        assert_eq!(hashes, vec!["3", "1", "2"]);
    }

    #[test]
    fn test_idempotent() {
        let txs = vec![
            tx("a", "0xw", COMPTROLLER),
            tx("b", "0xw", "0xdead"),
            tx("c", COMPTROLLER, "0xw"),
        ];
        let once = filter_protocol_transactions(&txs, COMPTROLLER);
        let twice = filter_protocol_transactions(&once, COMPTROLLER);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_empty_input() {
        assert!(filter_protocol_transactions(&[], COMPTROLLER).is_empty());
    }
}
