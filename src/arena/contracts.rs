//! Solidity interfaces the agent talks to.

use alloy_sol_types::sol;

// ============================================
// ARENA INTERFACES
// ============================================

sol! {
    /// BattleArena - creates, tracks and settles LP battles
    interface IBattleArena {
        struct Battle {
            address creator;
            address opponent;
            bytes32 poolId;
            int24 creatorTickLower;
            int24 creatorTickUpper;
            int24 opponentTickLower;
            int24 opponentTickUpper;
            uint8 battleType;
            uint8 status;
            uint256 startTime;
            uint256 duration;
            uint256 lastUpdateTime;
            uint256 creatorInRangeTime;
            uint256 opponentInRangeTime;
            uint256 creatorScore;
            uint256 opponentScore;
            address winner;
            uint256 totalFees;
            uint256 resolverBps;
            uint8 dexType;
            uint256 creatorFees;
            uint256 opponentFees;
            uint256 creatorLpValue;
            uint256 opponentLpValue;
        }

        function getActiveBattles() external view returns (uint256[] memory);
        function getPendingBattles() external view returns (uint256[] memory);
        function getExpiredBattles() external view returns (uint256[] memory);
        function getBattle(uint256 battleId) external view returns (Battle memory);
        function isBattleExpired(uint256 battleId) external view returns (bool);

        function settleBattle(uint256 battleId) external;
    }

    /// Stylus leaderboard (ELO ratings)
    interface ILeaderboard {
        function getElo(address player) external view returns (uint256);
    }
}

// ============================================
// VAULT INTERFACE
// ============================================

sol! {
    interface IERC4626 {
        function name() external view returns (string memory);
        function asset() external view returns (address);
        function totalAssets() external view returns (uint256);
        function totalSupply() external view returns (uint256);
        function balanceOf(address account) external view returns (uint256);
    }
}
