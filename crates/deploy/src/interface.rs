//! Machine-readable description of the lottery's external interface.
//!
//! Front-ends use this to encode calls and decode notifications, so the
//! names and argument lists must match the on-chain identifiers exactly.

use serde_json::{json, Value};

fn param(name: &str, ty: &str) -> Value {
    json!({ "name": name, "type": ty, "internalType": ty })
}

fn indexed(name: &str, ty: &str) -> Value {
    json!({ "indexed": true, "name": name, "type": ty, "internalType": ty })
}

fn view(name: &str, inputs: Vec<Value>, output: &str) -> Value {
    json!({
        "type": "function",
        "name": name,
        "stateMutability": "view",
        "inputs": inputs,
        "outputs": [param("", output)],
    })
}

fn error(name: &str, inputs: Vec<Value>) -> Value {
    json!({ "type": "error", "name": name, "inputs": inputs })
}

fn event(name: &str, inputs: Vec<Value>) -> Value {
    json!({ "type": "event", "name": name, "anonymous": false, "inputs": inputs })
}

/// The lottery interface: constructor, errors, events and functions.
pub fn lottery_interface() -> Value {
    json!([
        {
            "type": "constructor",
            "stateMutability": "nonpayable",
            "inputs": [
                param("vrfCoordinatorV2", "address"),
                param("entranceFee", "uint256"),
                param("gasLane", "bytes32"),
                param("subscriptionId", "uint64"),
                param("callbackGasLimit", "uint32"),
                param("interval", "uint256"),
            ],
        },
        error("Lottery__LotteryNotOpen", vec![]),
        error("Lottery__SendMoreToEnterLottery", vec![]),
        error("Lottery__TransferFailed", vec![]),
        error(
            "Lottery__UpkeepNotNeeded",
            vec![
                param("currentBalance", "uint256"),
                param("numPlayers", "uint256"),
                param("lotteryState", "uint256"),
            ],
        ),
        error(
            "OnlyCoordinatorCanFulfill",
            vec![param("have", "address"), param("want", "address")],
        ),
        event("LotteryEnter", vec![indexed("player", "address")]),
        event("RequestedLotteryWinner", vec![indexed("requestId", "uint256")]),
        event("WinnerPicked", vec![indexed("winner", "address")]),
        {
            "type": "function",
            "name": "checkUpkeep",
            "stateMutability": "view",
            "inputs": [param("", "bytes")],
            "outputs": [param("upkeepNeeded", "bool"), param("", "bytes")],
        },
        {
            "type": "function",
            "name": "enterLottery",
            "stateMutability": "payable",
            "inputs": [],
            "outputs": [],
        },
        {
            "type": "function",
            "name": "performUpkeep",
            "stateMutability": "nonpayable",
            "inputs": [param("", "bytes")],
            "outputs": [],
        },
        {
            "type": "function",
            "name": "rawFulfillRandomWords",
            "stateMutability": "nonpayable",
            "inputs": [param("requestId", "uint256"), param("randomWords", "uint256[]")],
            "outputs": [],
        },
        view("getBlockTimeStamp", vec![], "uint256"),
        view("getEntranceFee", vec![], "uint256"),
        view("getInterval", vec![], "uint256"),
        view("getLastTimeStamp", vec![], "uint256"),
        view("getLotteryState", vec![], "uint8"),
        view("getNumWords", vec![], "uint256"),
        view("getNumberOfPlayers", vec![], "uint256"),
        view("getPlayer", vec![param("index", "uint256")], "address"),
        view("getRecentWinner", vec![], "address"),
        view("getRequestConfirmations", vec![], "uint256"),
    ])
}
