//! In-memory collaborators shared by unit tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use crate::amount::Amount;
use crate::campaign::CampaignAggregate;
use crate::connection::{Identity, IdentityProvider};
use crate::errors::{LedgerError, WalletError};
use crate::ledger::{
    AccountState, FeeEstimator, LedgerQuery, SignedTransfer, Signer, SubmissionReceipt, Submitter,
    TransferRequest,
};
use crate::session::Session;

pub const DONOR: &str = "GDGQVOKHW4VEJRU2TETD6DBRKEO5ERCNF353LW5WBFW3JJWQ2BRQF3YM";

pub fn session_with_target(units: i64) -> Session {
    let target = Amount::from_units(units).unwrap();
    Session::new(CampaignAggregate::new(target).unwrap())
}

pub fn receipt(hash: &str) -> SubmissionReceipt {
    SubmissionReceipt {
        hash: hash.to_string(),
        ledger: Some(1),
    }
}

pub struct FakeLedger {
    pub sequence: i64,
    pub fee: u32,
    pub load_error: Option<LedgerError>,
    pub submit_error: Option<LedgerError>,
    pub load_delay: Duration,
    pub loads: AtomicUsize,
    pub submitted: AtomicUsize,
}

impl Default for FakeLedger {
    fn default() -> Self {
        FakeLedger {
            sequence: 100,
            fee: 100,
            load_error: None,
            submit_error: None,
            load_delay: Duration::ZERO,
            loads: AtomicUsize::new(0),
            submitted: AtomicUsize::new(0),
        }
    }
}

impl FakeLedger {
    pub fn account_loads(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }

    pub fn submissions(&self) -> usize {
        self.submitted.load(Ordering::SeqCst)
    }
}

impl LedgerQuery for FakeLedger {
    async fn load_account(&self, identity: &Identity) -> Result<AccountState, LedgerError> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        if !self.load_delay.is_zero() {
            tokio::time::sleep(self.load_delay).await;
        }
        match &self.load_error {
            Some(e) => Err(e.clone()),
            None => Ok(AccountState {
                account_id: identity.clone(),
                sequence: self.sequence,
            }),
        }
    }
}

impl FeeEstimator for FakeLedger {
    async fn base_fee(&self) -> Result<u32, LedgerError> {
        Ok(self.fee)
    }
}

impl Submitter for FakeLedger {
    async fn submit(&self, _signed: &SignedTransfer) -> Result<SubmissionReceipt, LedgerError> {
        let n = self.submitted.fetch_add(1, Ordering::SeqCst);
        match &self.submit_error {
            Some(e) => Err(e.clone()),
            None => Ok(receipt(&format!("{n:064x}"))),
        }
    }
}

pub struct FakeWallet {
    pub identity: String,
    pub envelope: String,
    pub refuse_connect: bool,
    pub refuse_sign: bool,
    pub connects: AtomicUsize,
    pub signed: Mutex<Vec<TransferRequest>>,
}

impl Default for FakeWallet {
    fn default() -> Self {
        FakeWallet {
            identity: DONOR.to_string(),
            envelope: "AAAAAgAAAADZ".to_string(),
            refuse_connect: false,
            refuse_sign: false,
            connects: AtomicUsize::new(0),
            signed: Mutex::new(Vec::new()),
        }
    }
}

impl FakeWallet {
    pub fn connect_calls(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    pub fn signed_requests(&self) -> Vec<TransferRequest> {
        self.signed.lock().unwrap().clone()
    }
}

impl IdentityProvider for FakeWallet {
    async fn connect(&self) -> Result<Identity, WalletError> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        if self.refuse_connect {
            return Err(WalletError::Rejected("user closed the modal".to_string()));
        }
        Ok(Identity::new(self.identity.clone()))
    }
}

impl Signer for FakeWallet {
    async fn sign(
        &self,
        request: &TransferRequest,
        _network_passphrase: &str,
    ) -> Result<SignedTransfer, WalletError> {
        if self.refuse_sign {
            return Err(WalletError::Rejected("user declined".to_string()));
        }
        self.signed.lock().unwrap().push(request.clone());
        Ok(SignedTransfer {
            envelope_xdr: self.envelope.clone(),
        })
    }
}
